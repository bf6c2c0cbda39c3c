use std::path::PathBuf;

use clap::Args;
use nest_core::StegoKey;

use crate::cli::{parse_stego_key, Settings};
use crate::CliResult;

/// Estimates how much a carrier can take
#[derive(Args, Debug)]
pub struct CapacityArgs {
    /// Carrier media, a directory is treated as video frames
    #[arg(short = 'i', long = "in", value_name = "media file", required = true)]
    pub media: PathBuf,

    /// Passphrase, only video frame selection depends on it
    #[arg(short, long, value_name = "password")]
    pub password: Option<String>,

    /// Hex stego key, wins over the passphrase
    #[arg(short = 'k', long, value_name = "hex key")]
    pub stego_key: Option<String>,
}

impl CapacityArgs {
    pub fn run(self, settings: &Settings) -> CliResult<()> {
        let key = match (&self.stego_key, &self.password) {
            (Some(hex_key), _) => parse_stego_key(hex_key)?,
            (None, Some(password)) => StegoKey::from_passphrase(password),
            (None, None) => StegoKey::from_passphrase(""),
        };

        let report =
            nest_core::commands::capacity(&self.media, &key, &settings.options, &settings.kdf)?;
        println!("{report}");
        Ok(())
    }
}
