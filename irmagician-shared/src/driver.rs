use std::time::Duration;

use crate::addressing::{address_of, MAX_SAMPLES};
use crate::delay::{Delay, StdDelay};
use crate::error::{Error, Result};
use crate::link::{DeviceConfig, Link, SerialLink};
use crate::protocol::{parse_int, Command, CommandTable, Timing, BUFFER_SIZE};
use crate::record::WaveformRecord;

/// Driver for one irMagician.
///
/// The device keeps the current bank and record pointer to itself. Nothing
/// here caches them: every operation that depends on them sets them first.
pub struct IrMagician<L = SerialLink, D = StdDelay> {
    link: L,
    delay: D,
    table: CommandTable,
    timing: Timing,
}

impl IrMagician<SerialLink, StdDelay> {
    pub fn open(config: &DeviceConfig) -> Result<Self> {
        let link = SerialLink::connect(config)?;
        log::info!("Connected to {}", link.name());
        Ok(IrMagician::new(link, StdDelay))
    }
}

impl<L: Link, D: Delay> IrMagician<L, D> {
    pub fn new(link: L, delay: D) -> Self {
        IrMagician {
            link,
            delay,
            table: CommandTable::default(),
            timing: Timing::default(),
        }
    }

    pub fn with_commands(mut self, table: CommandTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Release the link. Dropping the driver does the same.
    pub fn close(self) {
        log::debug!("Closing device");
        drop(self);
    }

    /// Send a command and, unless it is write-only, read the reply after its
    /// settle delay.
    pub fn send(&mut self, cmd: Command) -> Result<Vec<u8>> {
        let settle = self.timing.settle(&cmd);
        self.send_with(cmd, settle)
    }

    fn send_with(&mut self, cmd: Command, settle: Duration) -> Result<Vec<u8>> {
        let line = cmd.render(&self.table)?;
        log::debug!("-> {:?}", line.as_str());

        self.link.write_all(line.as_bytes())?;

        if !cmd.expects_reply() {
            return Ok(Vec::new());
        }

        if !settle.is_zero() {
            self.delay.delay(settle);
        }

        let mut buf = [0; BUFFER_SIZE];
        let n = self.link.read(&mut buf)?;
        log::debug!("<- {:?}", String::from_utf8_lossy(&buf[..n]));

        Ok(buf[..n].to_vec())
    }

    pub fn bank_set(&mut self, bank: u32) -> Result<()> {
        self.send(Command::BankSet(bank)).map(drop)
    }

    /// Start sampling. The waveform stays on the device until saved.
    pub fn capture(&mut self) -> Result<Vec<u8>> {
        self.send(Command::Capture)
    }

    pub fn dump(&mut self, position: u32) -> Result<Vec<u8>> {
        self.send(Command::Dump(position))
    }

    pub fn information(&mut self, param: u32) -> Result<Vec<u8>> {
        self.send(Command::Information(param))
    }

    pub fn set_postscaler(&mut self, value: u32) -> Result<Vec<u8>> {
        self.send(Command::SetPostScaler(value))
    }

    pub fn led(&mut self, on: bool) -> Result<Vec<u8>> {
        self.send(Command::Led(on))
    }

    pub fn modulation(&mut self, param: u32) -> Result<Vec<u8>> {
        self.send(Command::Modulation(param))
    }

    pub fn set_record_pointer(&mut self, point: u32) -> Result<Vec<u8>> {
        self.send(Command::SetRecordPointer(point))
    }

    pub fn play(&mut self) -> Result<Vec<u8>> {
        self.send(Command::Play)
    }

    pub fn reset(&mut self, n: u32) -> Result<Vec<u8>> {
        self.send(Command::Reset(n))
    }

    pub fn version(&mut self) -> Result<Vec<u8>> {
        self.send(Command::Version)
    }

    pub fn write(&mut self, position: u32, value: u8) -> Result<()> {
        self.send(Command::Write { position, value }).map(drop)
    }

    /// Samples in the last capture, info register 1 (hex)
    pub fn record_count(&mut self) -> Result<usize> {
        let resp = self.information(1)?;
        Ok(parse_int(&resp, 16)? as usize)
    }

    /// Postscaler of the last capture, info register 6 (decimal)
    pub fn postscaler(&mut self) -> Result<u8> {
        let resp = self.information(6)?;
        let value = parse_int(&resp, 10)?;

        match u8::try_from(value) {
            Ok(scale) if scale > 0 => Ok(scale),
            _ => Err(Error::Parse {
                text: value.to_string(),
                radix: 10,
            }),
        }
    }

    /// Read the captured waveform out of the device memory.
    ///
    /// Either the whole record is returned or the first error.
    pub fn save_captured_waveform(&mut self) -> Result<WaveformRecord> {
        let count = self.record_count()?;
        let scale = self.postscaler()?;

        log::info!("Record count: {}, postscaler: {}", count, scale);

        if count > MAX_SAMPLES {
            return Err(Error::Validation {
                command: "record count",
                value: count as u32,
                range: "0-640",
            });
        }

        let mut data = Vec::with_capacity(count);
        for i in 0..count {
            let addr = address_of(i);
            if addr.starts_bank() {
                self.bank_set(addr.bank)?;
            }

            let resp = self.dump(addr.position)?;
            let value = parse_int(&resp, 16)?;
            let byte = u8::try_from(value).map_err(|_| Error::Parse {
                text: format!("{:x}", value),
                radix: 16,
            })?;

            data.push(byte);
        }

        log::info!("Read {} samples", data.len());

        Ok(WaveformRecord::new(scale, data))
    }

    /// Upload `record` and transmit it.
    pub fn play_waveform_record(&mut self, record: &WaveformRecord) -> Result<Vec<u8>> {
        let len = record.data.len();
        if len > MAX_SAMPLES {
            return Err(Error::Validation {
                command: "play",
                value: u32::try_from(len).unwrap_or(u32::MAX),
                range: "0-640",
            });
        }
        Command::SetPostScaler(u32::from(record.scale)).validate()?;

        let resp = self.set_record_pointer(len as u32)?;
        log::debug!("Record pointer set: {}", String::from_utf8_lossy(&resp).trim());

        let resp = self.set_postscaler(u32::from(record.scale))?;
        log::debug!("Postscaler set: {}", String::from_utf8_lossy(&resp).trim());

        log::info!("Uploading {} samples", len);

        for (i, &value) in record.data.iter().enumerate() {
            let addr = address_of(i);
            if addr.starts_bank() {
                self.bank_set(addr.bank)?;
            }
            self.write(addr.position, value)?;
        }

        self.play()
    }

    /// Transmit whatever waveform the device currently holds.
    pub fn play_stored(&mut self) -> Result<Vec<u8>> {
        let settle = self.timing.play_stored;
        self.send_with(Command::Play, settle)
    }
}
