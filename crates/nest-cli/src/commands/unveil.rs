use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use nest_core::NestError;
use nest_crypto::private_key_from_pem;

use super::read_pem;
use crate::cli::{parse_stego_key, passphrase_or_prompt, Settings};
use crate::CliResult;

/// Unveils a payload, carrier options must match the ones used for hiding
#[derive(Args, Debug)]
pub struct UnveilArgs {
    /// Passphrase used to encrypt the payload
    #[arg(short, long, value_name = "password")]
    pub password: Option<String>,

    /// Media that contains the payload
    #[arg(
        short = 'i',
        long = "in",
        value_name = "media source file",
        required = true
    )]
    pub media: PathBuf,

    /// Payload will be stored as this file, printed to stdout when missing
    #[arg(short = 'o', long = "out", value_name = "output file")]
    pub output_file: Option<PathBuf>,

    /// PEM private key of the recipient the payload was sealed for
    #[arg(long, value_name = "private key file")]
    pub private_key: Option<PathBuf>,

    /// Hex stego key used when hiding
    #[arg(short = 'k', long, value_name = "hex key")]
    pub stego_key: Option<String>,
}

impl UnveilArgs {
    pub fn run(self, settings: &Settings) -> CliResult<()> {
        let stego_key = self.stego_key.as_deref().map(parse_stego_key).transpose()?;
        let password = if self.private_key.is_some() && stego_key.is_some() {
            self.password
        } else {
            passphrase_or_prompt(self.password, false)
        };

        let mut api = nest_core::api::extract::prepare()
            .with_options(settings.options.clone())
            .from_secret_file(&self.media)
            .using_password(password)
            .with_event_sink(settings.events.clone());

        if let Some(private_key) = &self.private_key {
            api = api.with_private_key(private_key_from_pem(&read_pem(private_key)?)?);
        }
        if let Some(key) = stego_key {
            api = api.with_stego_key(key);
        }

        match self.output_file {
            Some(output) => {
                let output = api.into_output_file(output).execute()?;
                println!("Payload stored in {}", output.display());
            }
            None => {
                let payload = api.reveal()?;
                std::io::stdout()
                    .write_all(&payload)
                    .map_err(|source| NestError::WriteError { source })?;
            }
        }
        Ok(())
    }
}
