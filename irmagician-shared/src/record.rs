use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const RAW_FORMAT: &str = "raw";
/// Carrier frequency in kHz used by fresh captures
pub const DEFAULT_FREQUENCY: u32 = 38;

/// A captured waveform as stored on disk.
///
/// ```json
/// {"scale":10,"format":"raw","freq":38,"data":[40,12,9]}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct WaveformRecord {
    /// Playback postscaler, 1-255
    pub scale: u8,
    /// Carried through untouched, "raw" is the only known value
    pub format: String,
    /// Carrier frequency in kHz
    #[serde(rename = "freq")]
    pub frequency: u32,
    /// One byte per memory cell
    pub data: Vec<u8>,
}

impl WaveformRecord {
    pub fn new(scale: u8, data: Vec<u8>) -> Self {
        WaveformRecord {
            scale,
            format: RAW_FORMAT.to_string(),
            frequency: DEFAULT_FREQUENCY,
            data,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 {
            return Err(Error::Format("scale must be in 1-255, got 0".to_string()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Format(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let record: WaveformRecord =
            serde_json::from_slice(bytes).map_err(|e| Error::Format(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_json(&bytes)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_json()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
