//! Driver for the irMagician infrared remote controller.
//!
//! The device speaks a line based ASCII protocol over a serial port. Captured
//! waveforms live in ten banks of 64 cells on the device and are stored on the
//! host as JSON [`WaveformRecord`]s.

pub mod addressing;
pub mod delay;
pub mod driver;
pub mod error;
pub mod link;
pub mod protocol;
pub mod record;

#[cfg(test)]
mod sim;

pub use addressing::{address_of, Address, MAX_SAMPLES};
pub use delay::{Delay, StdDelay};
pub use driver::IrMagician;
pub use error::{Error, Result};
pub use link::{DeviceConfig, Link, SerialLink};
pub use protocol::{parse_int, Command, CommandTable, Timing};
pub use record::WaveformRecord;
