use std::collections::HashSet;
use std::io::{Read, Write};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Byte channel to the device.
///
/// `read` returns whatever arrived, which may be less than the buffer. A read
/// that sees nothing within the timeout fails with [`Error::Timeout`].
pub trait Link {
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<L: Link + ?Sized> Link for &mut L {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_all(buf)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn claimed_ports() -> &'static Mutex<HashSet<String>> {
    static PORTS: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    PORTS.get_or_init(Default::default)
}

/// Marks a port name as in use by this process until dropped.
#[derive(Debug)]
struct PortClaim {
    name: String,
}

impl PortClaim {
    fn acquire(name: &str) -> Result<Self> {
        let mut ports = claimed_ports()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !ports.insert(name.to_string()) {
            return Err(Error::DeviceUnavailable {
                port: name.to_string(),
                reason: "already open in this process".to_string(),
            });
        }

        Ok(PortClaim {
            name: name.to_string(),
        })
    }
}

impl Drop for PortClaim {
    fn drop(&mut self) {
        claimed_ports()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.name);
    }
}

/// Exclusively owned serial connection. Closed when dropped.
pub struct SerialLink {
    // Declared before the claim so the port closes first
    port: Box<dyn SerialPort>,
    claim: PortClaim,
}

impl SerialLink {
    pub fn connect(config: &DeviceConfig) -> Result<Self> {
        let claim = PortClaim::acquire(&config.port)?;

        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| Error::DeviceUnavailable {
                port: config.port.clone(),
                reason: e.to_string(),
            })?;

        log::debug!(
            "Opened {} at {} baud, timeout {:?}",
            config.port,
            config.baud_rate,
            config.read_timeout
        );

        Ok(SerialLink { port, claim })
    }

    pub fn name(&self) -> &str {
        &self.claim.name
    }
}

impl Link for SerialLink {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        Ok(self.port.write_all(buf)?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.port.read(buf)?)
    }
}
