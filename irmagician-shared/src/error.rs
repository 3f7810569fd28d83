use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The serial port could not be opened
    #[error("device {port} unavailable: {reason}")]
    DeviceUnavailable { port: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[source] io::Error),

    /// Nothing arrived within the configured read timeout
    #[error("timed out waiting for the device")]
    Timeout,

    /// Command argument rejected before anything was sent
    #[error("{command}: {value} is out of range ({range})")]
    Validation {
        command: &'static str,
        value: u32,
        range: &'static str,
    },

    #[error("cannot parse {text:?} as a base {radix} integer")]
    Parse { text: String, radix: u32 },

    /// Malformed waveform record
    #[error("invalid waveform record: {0}")]
    Format(String),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut => Error::Timeout,
            _ => Error::Io(e),
        }
    }
}
