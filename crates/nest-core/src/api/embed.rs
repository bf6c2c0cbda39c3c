use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use nest_crypto::{KdfParams, RsaPublicKey};
use zeroize::Zeroizing;

use super::{resolve_stego_key, Password};
use crate::envelope::{self, SealingKey};
use crate::events::{EventSink, LogSink, OperationEvent};
use crate::media::{Carrier, CarrierOptions, Media, Persist};
use crate::{NestError, Result, StegoKey};

pub fn prepare() -> EmbedApi {
    EmbedApi::default()
}

pub struct EmbedApi {
    carrier: Option<PathBuf>,
    payload: Option<Zeroizing<Vec<u8>>>,
    payload_file: Option<PathBuf>,
    output: Option<PathBuf>,
    password: Password,
    stego_key: Option<StegoKey>,
    recipient: Option<RsaPublicKey>,
    kdf: KdfParams,
    options: CarrierOptions,
    events: Arc<dyn EventSink>,
}

impl Default for EmbedApi {
    fn default() -> Self {
        Self {
            carrier: None,
            payload: None,
            payload_file: None,
            output: None,
            password: Password::default(),
            stego_key: None,
            recipient: None,
            kdf: KdfParams::default(),
            options: CarrierOptions::default(),
            events: Arc::new(LogSink),
        }
    }
}

impl EmbedApi {
    /// Use the given carrier options
    pub fn with_options(mut self, options: CarrierOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// The cover medium: a PNG/BMP image, a WAV file, a text file or a directory of frames
    pub fn with_carrier<A: AsRef<Path>>(mut self, carrier: A) -> Self {
        self.carrier = Some(carrier.as_ref().to_path_buf());
        self
    }

    pub fn with_payload<B: Into<Vec<u8>>>(mut self, payload: B) -> Self {
        self.payload = Some(Zeroizing::new(payload.into()));
        self
    }

    /// Hides the content of this file, ignored when a payload is set directly
    pub fn with_payload_file<A: AsRef<Path>>(mut self, payload_file: A) -> Self {
        self.payload_file = Some(payload_file.as_ref().to_path_buf());
        self
    }

    pub fn with_output<A: AsRef<Path>>(mut self, output: A) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    /// Set the passphrase, it derives the encryption key and, unless set explicitly, the stego key
    pub fn using_password<P: Into<Password>>(mut self, password: P) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_password(self, password: &str) -> Self {
        self.using_password(password)
    }

    pub fn with_stego_key(mut self, key: StegoKey) -> Self {
        self.stego_key = Some(key);
        self
    }

    /// Seal for the holder of the matching private key instead of a passphrase
    pub fn with_recipient(mut self, public_key: RsaPublicKey) -> Self {
        self.recipient = Some(public_key);
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Executes the embedding and blocks until the output is written.
    ///
    /// Nothing is written when any step fails. Returns the path of the output.
    pub fn execute(self) -> Result<PathBuf> {
        let events = Arc::clone(&self.events);
        let carrier = self.carrier.clone();

        match self.embed() {
            Ok((output, payload_len)) => {
                if let Some(carrier) = &carrier {
                    info!("hid {payload_len} bytes from {carrier:?} in {output:?}");
                    events.record(&OperationEvent::embedded(carrier, &output, payload_len));
                }
                Ok(output)
            }
            Err(e) => {
                events.record(&OperationEvent::embed_failed(carrier.as_deref(), &e));
                Err(e)
            }
        }
    }

    fn embed(self) -> Result<(PathBuf, usize)> {
        let Some(carrier) = self.carrier else {
            return Err(NestError::CarrierNotSet);
        };
        let Some(output) = self.output else {
            return Err(NestError::TargetNotSet);
        };
        let payload = match (self.payload, &self.payload_file) {
            (Some(payload), _) => payload,
            (None, Some(file)) => {
                Zeroizing::new(fs::read(file).map_err(|source| NestError::ReadError { source })?)
            }
            (None, None) => return Err(NestError::MissingPayload),
        };

        let sealing_key = match (&self.recipient, self.password.as_str()) {
            (Some(public_key), _) => SealingKey::Recipient(public_key),
            (None, Some(password)) => SealingKey::Passphrase(password),
            (None, None) => {
                return Err(NestError::MissingKey(
                    "a passphrase or a recipient public key is needed to seal the payload",
                ))
            }
        };
        let stego_key = resolve_stego_key(self.stego_key, &self.password)?;

        let mut media = Media::from_file(&carrier, &self.options)?;
        let combined = envelope::seal(&payload, &sealing_key, &self.kdf)?;
        media.embed(&combined, &stego_key)?;
        media.save_as(&output)?;

        Ok((output, payload.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Action, MemorySink};
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn fast_kdf() -> KdfParams {
        KdfParams::default()
            .with_time_cost(1)
            .with_memory_cost(1024)
            .with_parallelism(1)
    }

    #[test]
    fn illustrate_api_usage() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let cover = temp_dir.path().join("cover.png");
        RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]))
            .save(&cover)
            .unwrap();

        let output = crate::api::embed::prepare()
            .with_payload("Hello, World!")
            .with_carrier(&cover)
            .with_password("SuperSecret42")
            .with_kdf_params(fast_kdf())
            .with_output(temp_dir.path().join("image-with-secret.png"))
            .execute()
            .expect("Failed to hide message in image");

        assert!(output.exists());
    }

    #[test]
    fn missing_inputs_are_reported_as_failed_events() {
        let events = Arc::new(MemorySink::default());

        let result = prepare()
            .with_payload("Hello")
            .with_output("never-written.png")
            .with_event_sink(events.clone())
            .execute();

        assert!(matches!(result, Err(NestError::CarrierNotSet)));
        let recorded = events.events();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].action, Action::EmbedFailed);
        assert!(!Path::new("never-written.png").exists());
    }

    #[test]
    fn payload_and_key_material_are_required() {
        let temp_dir = tempdir().unwrap();
        let output = temp_dir.path().join("out.png");

        assert!(matches!(
            prepare()
                .with_carrier("cover.png")
                .with_output(&output)
                .with_password("x")
                .execute(),
            Err(NestError::MissingPayload)
        ));
        assert!(matches!(
            prepare()
                .with_carrier("cover.png")
                .with_output(&output)
                .with_payload("x")
                .execute(),
            Err(NestError::MissingKey(_))
        ));
    }
}
