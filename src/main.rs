use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use structopt::StructOpt;

use irmagician_shared::link::DEFAULT_PORT;
use irmagician_shared::{CommandTable, DeviceConfig, IrMagician, WaveformRecord};

mod capture;
mod playback;
mod vcdutils;

#[derive(Debug, StructOpt)]
#[structopt(name = "irmagician", about = "irMagician infrared capture and playback")]
struct Opt {
    /// Serial Device. Defaults to /dev/ttyACM0
    #[structopt(long = "device")]
    serial: Option<String>,
    #[structopt(long, default_value = "9600")]
    baud: u32,
    /// Read timeout in milliseconds, at least 1
    #[structopt(long = "timeout-ms", default_value = "1000", parse(try_from_str = parse_timeout))]
    timeout_ms: u64,
    /// Letter of the info command, for firmware that expects another casing
    #[structopt(long = "info-letter")]
    info_letter: Option<char>,
    /// Letter of the play command
    #[structopt(long = "play-letter")]
    play_letter: Option<char>,
    #[structopt(short, long)]
    debug: bool,
    #[structopt(subcommand)]
    cmd: CliCommand,
}

#[derive(StructOpt, Debug)]
enum CliCommand {
    /// Capture a signal into device memory
    Capture,
    /// Save the captured signal. Defaults to <timestamp>.json
    Save { path: Option<PathBuf> },
    /// Play a saved signal, or the one stored on the device
    Play { path: Option<PathBuf> },
    /// Firmware version
    Version,
    /// Status led, on or off
    Led { state: LedState },
    /// Reset the device, 0 or 1
    Reset { n: u32 },
    /// Read info register 0-7
    Info { param: u32 },
    /// Write a saved signal as a vcd trace
    ///
    /// Samples are drawn as alternating mark and space, starting with a mark.
    /// The device does not report its tick length, so timing in the trace is
    /// only as accurate as --tick-us.
    ExportVcd {
        record: PathBuf,
        out: PathBuf,
        /// Assumed microseconds per sample tick at postscaler 1
        #[structopt(long = "tick-us", default_value = "100")]
        tick_us: u64,
    },
    /// List serial ports
    ListPorts,
}

fn parse_timeout(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("timeout must be at least 1 ms".to_string()),
        Ok(ms) => Ok(ms),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LedState {
    On,
    Off,
}

impl FromStr for LedState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" | "1" => Ok(LedState::On),
            "off" | "0" => Ok(LedState::Off),
            _ => Err(format!("expected on or off, got {:?}", s)),
        }
    }
}

impl Opt {
    fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            port: self.serial.clone().unwrap_or_else(|| DEFAULT_PORT.to_string()),
            baud_rate: self.baud,
            read_timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    fn command_table(&self) -> CommandTable {
        let default = CommandTable::default();
        CommandTable {
            information: self.info_letter.unwrap_or(default.information),
            play: self.play_letter.unwrap_or(default.play),
            ..default
        }
    }

    fn connect(&self) -> anyhow::Result<IrMagician> {
        let config = self.device_config();
        let ir = IrMagician::open(&config)
            .with_context(|| format!("opening {}", config.port))?
            .with_commands(self.command_table());
        Ok(ir)
    }
}

fn show(resp: &[u8]) {
    println!("{}", String::from_utf8_lossy(resp).trim_end());
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();

    let loglevel = if opt.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(loglevel)
        .parse_env("RUST_LOG")
        .init();

    match &opt.cmd {
        CliCommand::Capture => {
            let mut ir = opt.connect()?;
            capture::command_capture(&mut ir)?;
            ir.close();
        }
        CliCommand::Save { path } => {
            let mut ir = opt.connect()?;
            capture::command_save(&mut ir, path.clone())?;
            ir.close();
        }
        CliCommand::Play { path } => {
            let mut ir = opt.connect()?;
            playback::command_play(&mut ir, path.as_deref())?;
            ir.close();
        }
        CliCommand::Version => {
            let mut ir = opt.connect()?;
            show(&ir.version()?);
            ir.close();
        }
        CliCommand::Led { state } => {
            let mut ir = opt.connect()?;
            show(&ir.led(*state == LedState::On)?);
            ir.close();
        }
        CliCommand::Reset { n } => {
            let mut ir = opt.connect()?;
            show(&ir.reset(*n)?);
            ir.close();
        }
        CliCommand::Info { param } => {
            let mut ir = opt.connect()?;
            show(&ir.information(*param)?);
            ir.close();
        }
        CliCommand::ExportVcd {
            record,
            out,
            tick_us,
        } => {
            let waveform = WaveformRecord::load(record)
                .with_context(|| format!("loading {}", record.display()))?;
            vcdutils::export_record(&waveform, out, *tick_us)
                .with_context(|| format!("writing {}", out.display()))?;
            log::info!("Wrote {}", out.display());
        }
        CliCommand::ListPorts => {
            for port in serialport::available_ports().context("listing serial ports")? {
                println!("{}\t{:?}", port.port_name, port.port_type);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_states() {
        assert_eq!("on".parse::<LedState>(), Ok(LedState::On));
        assert_eq!("0".parse::<LedState>(), Ok(LedState::Off));
        assert!("maybe".parse::<LedState>().is_err());
    }

    #[test]
    fn options_build_config_and_table() {
        let opt = Opt::from_iter(&[
            "irmagician",
            "--device",
            "/dev/ttyUSB1",
            "--timeout-ms",
            "250",
            "--info-letter",
            "i",
            "--play-letter",
            "P",
            "play",
        ]);

        let config = opt.device_config();
        assert_eq!(config.port, "/dev/ttyUSB1");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.read_timeout, Duration::from_millis(250));

        let table = opt.command_table();
        assert_eq!(table.information, 'i');
        assert_eq!(table.play, 'P');
        assert_eq!(table.dump, 'd');
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Opt::from_iter_safe(&["irmagician", "--timeout-ms", "0", "version"]).is_err());
        assert!(Opt::from_iter_safe(&["irmagician", "--timeout-ms", "1", "version"]).is_ok());
        assert_eq!(parse_timeout("0"), Err("timeout must be at least 1 ms".to_string()));
        assert_eq!(parse_timeout("250"), Ok(250));
    }

    #[test]
    fn defaults() {
        let opt = Opt::from_iter(&["irmagician", "save"]);
        assert_eq!(opt.device_config(), DeviceConfig::default());
        assert_eq!(opt.command_table(), CommandTable::default());
    }
}
