use std::path::PathBuf;

use clap::Args;
use nest_crypto::public_key_from_pem;

use super::read_pem;
use crate::cli::{parse_stego_key, passphrase_or_prompt, Settings};
use crate::CliResult;

/// Hides an encrypted payload in a PNG/BMP image, WAV audio, a frame directory or a text file
#[derive(Args, Debug)]
pub struct HideArgs {
    /// Passphrase used to encrypt the payload and to place its bits
    #[arg(short, long, value_name = "password")]
    pub password: Option<String>,

    /// Carrier media, used readonly. A directory is treated as video frames.
    #[arg(short = 'i', long = "in", value_name = "media file", required = true)]
    pub media: PathBuf,

    /// Final carrier will be stored here, images always as PNG
    #[arg(short = 'o', long = "out", value_name = "output file", required = true)]
    pub write_to_file: PathBuf,

    /// File to hide
    #[arg(
        short = 'd',
        long = "data",
        value_name = "data file",
        required_unless_present = "message"
    )]
    pub data_file: Option<PathBuf>,

    /// A text message that will be hidden
    #[arg(
        short,
        long,
        value_name = "text message",
        conflicts_with = "data_file"
    )]
    pub message: Option<String>,

    /// PEM public key, seals the payload for its owner instead of with the passphrase
    #[arg(short, long, value_name = "public key file")]
    pub recipient: Option<PathBuf>,

    /// Hex stego key that places the bits, instead of one derived from the passphrase
    #[arg(short = 'k', long, value_name = "hex key")]
    pub stego_key: Option<String>,
}

impl HideArgs {
    pub fn run(self, settings: &Settings) -> CliResult<()> {
        let stego_key = self.stego_key.as_deref().map(parse_stego_key).transpose()?;
        let password = if self.recipient.is_some() && stego_key.is_some() {
            self.password
        } else {
            passphrase_or_prompt(self.password, true)
        };

        let mut api = nest_core::api::embed::prepare()
            .with_options(settings.options.clone())
            .with_kdf_params(settings.kdf)
            .with_carrier(&self.media)
            .with_output(&self.write_to_file)
            .using_password(password)
            .with_event_sink(settings.events.clone());

        if let Some(message) = self.message {
            api = api.with_payload(message);
        }
        if let Some(file) = &self.data_file {
            api = api.with_payload_file(file);
        }
        if let Some(recipient) = &self.recipient {
            api = api.with_recipient(public_key_from_pem(&read_pem(recipient)?)?);
        }
        if let Some(key) = stego_key {
            api = api.with_stego_key(key);
        }

        let output = api.execute()?;
        println!("Payload hidden in {}", output.display());
        Ok(())
    }
}
