//! In-memory stand-in for the device, used by the driver tests.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::addressing::{BANK_SIZE, MAX_SAMPLES};
use crate::delay::Delay;
use crate::error::{Error, Result};
use crate::link::Link;

struct Pending {
    bytes: Vec<u8>,
    dump: bool,
}

pub struct SimDevice {
    /// Every line received, without the line ending
    pub lines: Vec<String>,
    pub memory: Vec<u8>,
    pub record_count: u32,
    pub postscaler: u32,
    /// Fail the read that answers the n-th dump (1-based)
    pub fail_dump_read: Option<usize>,
    /// Answer every info query with this text
    pub info_override: Option<String>,
    /// Fail the n-th write command (1-based)
    pub fail_write: Option<usize>,
    /// Stop answering from the n-th line received on (1-based)
    pub mute_from: Option<usize>,
    writes: usize,
    bank: usize,
    dumps: usize,
    pending: VecDeque<Pending>,
}

impl SimDevice {
    pub fn new() -> Self {
        SimDevice {
            lines: Vec::new(),
            memory: vec![0; MAX_SAMPLES],
            record_count: 0,
            postscaler: 1,
            fail_dump_read: None,
            info_override: None,
            fail_write: None,
            mute_from: None,
            writes: 0,
            bank: 0,
            dumps: 0,
            pending: VecDeque::new(),
        }
    }

    /// A device holding a capture of `count` samples
    pub fn with_capture(count: u32, postscaler: u32) -> Self {
        let mut sim = SimDevice::new();
        for (i, cell) in sim.memory.iter_mut().enumerate() {
            *cell = (i * 7 % 256) as u8;
        }
        sim.record_count = count;
        sim.postscaler = postscaler;
        sim
    }

    /// Lines that start with `letter`
    pub fn sent(&self, letter: char) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.starts_with(letter))
            .map(String::as_str)
            .collect()
    }

    fn reply(&mut self, text: String) {
        self.pending.push_back(Pending {
            bytes: text.into_bytes(),
            dump: false,
        });
    }

    fn execute(&mut self, line: &str) {
        let mut fields = line.split(',');
        let letter = fields.next().unwrap_or("").to_ascii_lowercase();
        let args: Vec<usize> = fields.map(|f| f.parse().unwrap()).collect();

        match letter.as_str() {
            "b" => self.bank = args[0],
            "c" => self.reply("...\r\nCapture done\r\n".to_string()),
            "d" => {
                let value = self.memory[self.bank * BANK_SIZE + args[0]];
                self.pending.push_back(Pending {
                    bytes: format!(" {:02X} \r\n", value).into_bytes(),
                    dump: true,
                });
            }
            "i" => {
                let text = match (&self.info_override, args[0]) {
                    (Some(text), _) => text.clone(),
                    (None, 1) => format!("{:X}\r\n", self.record_count),
                    (None, 6) => format!("{}\r\n", self.postscaler),
                    (None, _) => "0\r\n".to_string(),
                };
                self.reply(text);
            }
            "k" => {
                self.postscaler = args[0] as u32;
                self.reply("OK\r\n".to_string());
            }
            "n" => {
                self.record_count = args[0] as u32;
                self.reply("OK\r\n".to_string());
            }
            "p" => self.reply("... Done !\r\n".to_string()),
            "v" => self.reply("sim 1.0\r\n".to_string()),
            "l" | "m" | "r" => self.reply("OK\r\n".to_string()),
            "w" => self.memory[self.bank * BANK_SIZE + args[0]] = args[1] as u8,
            other => panic!("unknown command {:?}", other),
        }
    }
}

impl Link for SimDevice {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(buf).unwrap();
        assert!(text.ends_with("\r\n"), "unterminated line {:?}", text);

        let line = text.trim_end_matches("\r\n");
        self.lines.push(line.to_string());

        if line.to_ascii_lowercase().starts_with('w') {
            self.writes += 1;
            if self.fail_write == Some(self.writes) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped").into());
            }
        }

        let queued = self.pending.len();
        self.execute(line);
        if matches!(self.mute_from, Some(n) if self.lines.len() >= n) {
            self.pending.truncate(queued);
        }

        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let pending = self.pending.pop_front().ok_or(Error::Timeout)?;

        if pending.dump {
            self.dumps += 1;
            if self.fail_dump_read == Some(self.dumps) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped").into());
            }
        }

        let n = pending.bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&pending.bytes[..n]);
        Ok(n)
    }
}

/// Remembers the settle delays instead of sleeping
#[derive(Default)]
pub struct RecordingDelay {
    pub waits: Vec<Duration>,
}

impl Delay for RecordingDelay {
    fn delay(&mut self, duration: Duration) {
        self.waits.push(duration);
    }
}
