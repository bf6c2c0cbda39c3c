use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::Password;
use nest_core::audit::SecureEventLog;
use nest_core::container::check_kdf_bounds;
use nest_core::events::{EventSink, LogSink};
use nest_core::media::image::EdgeDetector;
use nest_core::{CarrierOptions, KdfParams, NestError, StegoKey};

use crate::commands::*;
use crate::CliResult;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Bits per 16 bit WAV sample, must match between hide and unveil
    #[arg(long, value_name = "bits", default_value_t = 1, global = true)]
    pub lsb_depth: u8,

    /// Share of video frames that carry data, in (0, 1]
    #[arg(long, value_name = "ratio", default_value_t = 0.5, global = true)]
    pub video_ratio: f64,

    /// How edge pixels of images are found
    #[arg(long, value_enum, default_value_t = EdgeDetectorArg::Sobel, global = true)]
    pub edge_detector: EdgeDetectorArg,

    /// Gradient magnitude above which a pixel counts as edge
    #[arg(long, value_name = "threshold", default_value_t = 100, global = true)]
    pub sobel_threshold: u32,

    /// Argon2id iterations for new containers
    #[arg(long, value_name = "iterations", global = true)]
    pub kdf_time: Option<u32>,

    /// Argon2id memory in KiB for new containers
    #[arg(long, value_name = "KiB", global = true)]
    pub kdf_memory: Option<u32>,

    /// Argon2id lanes for new containers
    #[arg(long, value_name = "lanes", global = true)]
    pub kdf_parallelism: Option<u32>,

    /// Encrypted log that receives an event for every hide and unveil
    #[arg(long, value_name = "log file", global = true)]
    pub audit_log: Option<PathBuf>,

    /// Administrator password of the audit log, asked for when missing
    #[arg(long, value_name = "password", global = true)]
    pub audit_password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Hide(hide::HideArgs),
    Unveil(unveil::UnveilArgs),
    Capacity(capacity::CapacityArgs),
    Keygen(keygen::KeygenArgs),
    Audit(audit::AuditArgs),
}

impl Commands {
    pub fn run(self, settings: &Settings) -> CliResult<()> {
        match self {
            Commands::Hide(args) => args.run(settings),
            Commands::Unveil(args) => args.run(settings),
            Commands::Capacity(args) => args.run(settings),
            Commands::Keygen(args) => args.run(),
            Commands::Audit(args) => args.run(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDetectorArg {
    Sobel,
    Variance,
}

impl From<EdgeDetectorArg> for EdgeDetector {
    fn from(arg: EdgeDetectorArg) -> Self {
        match arg {
            EdgeDetectorArg::Sobel => EdgeDetector::Sobel,
            EdgeDetectorArg::Variance => EdgeDetector::LocalVariance,
        }
    }
}

/// Everything the global flags resolve to, shared by the subcommands
pub struct Settings {
    pub options: CarrierOptions,
    pub kdf: KdfParams,
    pub events: Arc<dyn EventSink>,
}

impl CliArgs {
    pub fn settings(&self) -> CliResult<Settings> {
        let options = CarrierOptions::default()
            .with_lsb_depth(self.lsb_depth)
            .with_video_usage_ratio(self.video_ratio)
            .with_edge_detector(self.edge_detector.into())
            .with_sobel_threshold(self.sobel_threshold);
        options.validate()?;

        let kdf = self.kdf_params();
        check_kdf_bounds(&kdf).map_err(|e| NestError::InvalidOptions(e.to_string()))?;
        let events: Arc<dyn EventSink> = match &self.audit_log {
            Some(log) => {
                let password = self
                    .audit_password
                    .clone()
                    .or_else(|| ask_for_password("Audit log password", false))
                    .ok_or(NestError::MissingKey("audit log password"))?;
                Arc::new(SecureEventLog::open_or_create(log, &password, &kdf)?)
            }
            None => Arc::new(LogSink),
        };

        Ok(Settings {
            options,
            kdf,
            events,
        })
    }

    fn kdf_params(&self) -> KdfParams {
        let mut kdf = KdfParams::default();
        if let Some(time_cost) = self.kdf_time {
            kdf = kdf.with_time_cost(time_cost);
        }
        if let Some(memory_cost) = self.kdf_memory {
            kdf = kdf.with_memory_cost(memory_cost);
        }
        if let Some(parallelism) = self.kdf_parallelism {
            kdf = kdf.with_parallelism(parallelism);
        }
        kdf
    }
}

/// Prompts on the terminal, `None` when there is no terminal or input was aborted
pub fn ask_for_password(prompt: &str, confirm: bool) -> Option<String> {
    let mut password = Password::new().with_prompt(prompt);
    if confirm {
        password = password.with_confirmation("Repeat password", "The passwords don't match.");
    }
    password.interact().ok()
}

/// A 64 character hex string, used instead of the passphrase derived stego key
pub fn parse_stego_key(hex_key: &str) -> CliResult<StegoKey> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(hex_key.trim(), &mut bytes).map_err(|e| {
        NestError::InvalidOptions(format!("stego key must be 32 bytes of hex: {e}"))
    })?;
    Ok(StegoKey::from(bytes))
}

/// The passphrase from the command line, otherwise from the terminal.
pub fn passphrase_or_prompt(password: Option<String>, confirm: bool) -> Option<String> {
    password.or_else(|| ask_for_password("Password", confirm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_become_carrier_options() {
        let args = CliArgs::parse_from([
            "nest",
            "capacity",
            "-i",
            "cover.png",
            "--lsb-depth",
            "3",
            "--edge-detector",
            "variance",
            "--kdf-time",
            "2",
        ]);
        let settings = args.settings().unwrap();

        assert_eq!(settings.options.audio.lsb_depth, 3);
        assert_eq!(
            settings.options.image.edge_detector,
            EdgeDetector::LocalVariance
        );
        assert_eq!(settings.kdf.time_cost, 2);
        assert_eq!(settings.kdf.memory_cost, KdfParams::default().memory_cost);
    }

    #[test]
    fn out_of_range_options_are_refused() {
        let args = CliArgs::parse_from(["nest", "capacity", "-i", "x.wav", "--lsb-depth", "9"]);
        assert!(matches!(
            args.settings(),
            Err(NestError::InvalidOptions(_))
        ));

        let args = CliArgs::parse_from(["nest", "capacity", "-i", "x.png", "--kdf-time", "65"]);
        assert!(matches!(
            args.settings(),
            Err(NestError::InvalidOptions(_))
        ));
    }

    #[test]
    fn stego_keys_are_parsed_from_hex() {
        let key = parse_stego_key(&"ab".repeat(32)).unwrap();
        assert_eq!(key.as_bytes(), &[0xAB; 32]);

        assert!(parse_stego_key("abcd").is_err());
        assert!(parse_stego_key(&"zz".repeat(32)).is_err());
    }
}
