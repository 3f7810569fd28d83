use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;

use irmagician_shared::IrMagician;

pub fn command_capture(ir: &mut IrMagician) -> anyhow::Result<()> {
    log::info!("Capturing, point the remote at the device");

    let ack = ir.capture().context("capture")?;
    log::info!("{}", String::from_utf8_lossy(&ack).trim());

    Ok(())
}

/// Read the captured waveform off the device and write it to `path`.
///
/// Nothing is written unless the whole waveform was read.
pub fn command_save(ir: &mut IrMagician, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(default_record_path);

    let record = ir
        .save_captured_waveform()
        .context("reading captured waveform")?;

    record
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;

    log::info!("Dumped {} samples to {}", record.data.len(), path.display());

    Ok(())
}

fn default_record_path() -> PathBuf {
    PathBuf::from(format!("{}.json", Local::now().format("%Y%m%d%H%M%S")))
}
