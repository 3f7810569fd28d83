use core::fmt::Write;
use std::io;
use std::time::Duration;

use crate::error::{Error, Result};

/// Size of the buffer a response is read into
pub const BUFFER_SIZE: usize = 640;

/// Longest rendered command line, `n,4294967295\r\n` being the worst case
pub const LINE_CAPACITY: usize = 32;

pub type Line = heapless::String<LINE_CAPACITY>;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Command {
    /// Select the current memory bank
    BankSet(u32),
    /// Start sampling an incoming signal
    Capture,
    /// Read one cell of the current bank
    Dump(u32),
    /// Query an info register
    Information(u32),
    SetPostScaler(u32),
    Led(bool),
    Modulation(u32),
    /// Number of samples to play
    SetRecordPointer(u32),
    Play,
    Reset(u32),
    Version,
    /// Store one sample in the current bank
    Write { position: u32, value: u8 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::BankSet(_) => "bank-select",
            Command::Capture => "capture",
            Command::Dump(_) => "dump",
            Command::Information(_) => "info",
            Command::SetPostScaler(_) => "set-postscaler",
            Command::Led(_) => "led",
            Command::Modulation(_) => "modulation",
            Command::SetRecordPointer(_) => "set-record-pointer",
            Command::Play => "play",
            Command::Reset(_) => "reset",
            Command::Version => "version",
            Command::Write { .. } => "write",
        }
    }

    /// Check the arguments against the ranges the firmware accepts.
    pub fn validate(&self) -> Result<()> {
        let (value, valid, range) = match *self {
            Command::BankSet(n) => (n, 0..=9, "0-9"),
            Command::Dump(n) => (n, 0..=63, "0-63"),
            Command::Information(n) => (n, 0..=7, "0-7"),
            Command::SetPostScaler(n) => (n, 1..=255, "1-255"),
            Command::Modulation(n) => (n, 0..=2, "0-2"),
            Command::Reset(n) => (n, 0..=1, "0-1"),
            Command::Write { position, .. } => (position, 0..=63, "0-63"),
            Command::Capture
            | Command::Led(_)
            | Command::SetRecordPointer(_)
            | Command::Play
            | Command::Version => return Ok(()),
        };

        if !valid.contains(&value) {
            return Err(Error::Validation {
                command: self.name(),
                value,
                range,
            });
        }

        Ok(())
    }

    /// bank-select and write are acknowledged by nothing at all
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Command::BankSet(_) | Command::Write { .. })
    }

    /// Validate and render as `<letter>[,arg[,arg]]\r\n`.
    pub fn render(&self, table: &CommandTable) -> Result<Line> {
        self.validate()?;

        let mut line = Line::new();
        self.write_line(table.letter(self), &mut line)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "command line too long"))?;

        Ok(line)
    }

    fn write_line(&self, letter: char, line: &mut Line) -> core::fmt::Result {
        line.write_char(letter)?;

        match *self {
            Command::BankSet(n)
            | Command::Dump(n)
            | Command::Information(n)
            | Command::SetPostScaler(n)
            | Command::Modulation(n)
            | Command::SetRecordPointer(n)
            | Command::Reset(n) => write!(line, ",{}", n)?,
            Command::Led(on) => write!(line, ",{}", on as u8)?,
            Command::Write { position, value } => write!(line, ",{},{}", position, value)?,
            Command::Capture | Command::Play | Command::Version => (),
        }

        line.write_str("\r\n")
    }
}

/// Letter sent for each command.
///
/// Firmware revisions disagree on the casing of some letters (info and play
/// have both been seen in upper and lower case), so every letter can be
/// replaced.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommandTable {
    pub bank_set: char,
    pub capture: char,
    pub dump: char,
    pub information: char,
    pub set_postscaler: char,
    pub led: char,
    pub modulation: char,
    pub set_record_pointer: char,
    pub play: char,
    pub reset: char,
    pub version: char,
    pub write: char,
}

impl Default for CommandTable {
    fn default() -> Self {
        CommandTable {
            bank_set: 'b',
            capture: 'c',
            dump: 'd',
            information: 'I',
            set_postscaler: 'k',
            led: 'L',
            modulation: 'm',
            set_record_pointer: 'n',
            play: 'p',
            reset: 'R',
            version: 'V',
            write: 'w',
        }
    }
}

impl CommandTable {
    pub fn letter(&self, cmd: &Command) -> char {
        match cmd {
            Command::BankSet(_) => self.bank_set,
            Command::Capture => self.capture,
            Command::Dump(_) => self.dump,
            Command::Information(_) => self.information,
            Command::SetPostScaler(_) => self.set_postscaler,
            Command::Led(_) => self.led,
            Command::Modulation(_) => self.modulation,
            Command::SetRecordPointer(_) => self.set_record_pointer,
            Command::Play => self.play,
            Command::Reset(_) => self.reset,
            Command::Version => self.version,
            Command::Write { .. } => self.write,
        }
    }
}

/// How long to wait after sending a command before reading its reply.
///
/// The device has no end-of-message marker; a read issued too early returns
/// a stale or truncated response.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Timing {
    pub capture: Duration,
    pub information: Duration,
    pub set_postscaler: Duration,
    pub led: Duration,
    pub set_record_pointer: Duration,
    /// Play right after uploading a waveform
    pub play: Duration,
    /// Play whatever the device already holds
    pub play_stored: Duration,
    pub reset: Duration,
    pub version: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            capture: Duration::from_secs(1),
            information: Duration::from_millis(5),
            set_postscaler: Duration::from_millis(5),
            led: Duration::from_millis(5),
            set_record_pointer: Duration::from_millis(2),
            play: Duration::from_millis(2),
            play_stored: Duration::from_secs(1),
            reset: Duration::from_millis(1),
            version: Duration::from_millis(1),
        }
    }
}

impl Timing {
    pub fn settle(&self, cmd: &Command) -> Duration {
        match cmd {
            Command::Capture => self.capture,
            Command::Information(_) => self.information,
            Command::SetPostScaler(_) => self.set_postscaler,
            Command::Led(_) => self.led,
            Command::SetRecordPointer(_) => self.set_record_pointer,
            Command::Play => self.play,
            Command::Reset(_) => self.reset,
            Command::Version => self.version,
            Command::BankSet(_) | Command::Dump(_) | Command::Modulation(_) | Command::Write { .. } => {
                Duration::ZERO
            }
        }
    }
}

/// Parse the first line of a response as an integer in `radix`.
///
/// Surrounding whitespace is ignored, as is anything after the first line
/// break.
pub fn parse_int(resp: &[u8], radix: u32) -> Result<u32> {
    let text = String::from_utf8_lossy(resp);
    let first = text.trim_start().lines().next().unwrap_or("").trim();

    u32::from_str_radix(first, radix).map_err(|_| Error::Parse {
        text: first.to_string(),
        radix,
    })
}
