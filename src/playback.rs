use std::path::Path;

use anyhow::Context;

use irmagician_shared::{IrMagician, WaveformRecord};

/// Play the record at `path`, or the waveform already on the device when
/// there is none.
pub fn command_play(ir: &mut IrMagician, path: Option<&Path>) -> anyhow::Result<()> {
    let ack = match path {
        Some(path) => {
            let record = WaveformRecord::load(path)
                .with_context(|| format!("loading {}", path.display()))?;

            log::info!(
                "Playing {} ({} samples, postscaler {})",
                path.display(),
                record.data.len(),
                record.scale
            );

            ir.play_waveform_record(&record).context("play")?
        }
        None => {
            log::info!("Playing stored waveform");
            ir.play_stored().context("play")?
        }
    };

    log::info!("{}", String::from_utf8_lossy(&ack).trim());

    Ok(())
}
