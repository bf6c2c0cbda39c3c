use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use nest_crypto::{RsaPrivateKey, SecretBytes};

use super::{resolve_stego_key, Password};
use crate::envelope::{self, OpeningKey};
use crate::events::{EventSink, LogSink, OperationEvent};
use crate::media::{persist_atomically, CarrierOptions, Media};
use crate::{NestError, Result, StegoKey};

pub fn prepare() -> ExtractApi {
    ExtractApi::default()
}

pub struct ExtractApi {
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    password: Password,
    stego_key: Option<StegoKey>,
    private_key: Option<RsaPrivateKey>,
    options: CarrierOptions,
    events: Arc<dyn EventSink>,
}

impl Default for ExtractApi {
    fn default() -> Self {
        Self {
            source: None,
            output: None,
            password: Password::default(),
            stego_key: None,
            private_key: None,
            options: CarrierOptions::default(),
            events: Arc::new(LogSink),
        }
    }
}

impl ExtractApi {
    /// Use the same carrier options that were used for embedding
    pub fn with_options(mut self, options: CarrierOptions) -> Self {
        self.options = options;
        self
    }

    /// This is the stego medium that contains the hidden container
    pub fn from_secret_file<A: AsRef<Path>>(mut self, source: A) -> Self {
        self.source = Some(source.as_ref().to_path_buf());
        self
    }

    /// This is the file the payload will be saved to
    pub fn into_output_file<A: AsRef<Path>>(mut self, output: A) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

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

    /// Open a container that was sealed for a recipient public key
    pub fn with_private_key(mut self, private_key: RsaPrivateKey) -> Self {
        self.private_key = Some(private_key);
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Extracts the payload and writes it to the output file, returns the output path.
    pub fn execute(self) -> Result<PathBuf> {
        let result = match &self.output {
            Some(output) => self.unveil().and_then(|payload| {
                persist_atomically(output, |f| Ok(f.write_all(&payload)?))?;
                Ok((output.clone(), payload.len()))
            }),
            None => Err(NestError::TargetNotSet),
        };

        match result {
            Ok((output, payload_len)) => {
                self.record_success(Some(&output), payload_len);
                Ok(output)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Extracts the payload and hands it over in memory.
    pub fn reveal(self) -> Result<SecretBytes> {
        match self.unveil() {
            Ok(payload) => {
                self.record_success(None, payload.len());
                Ok(payload)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    fn unveil(&self) -> Result<SecretBytes> {
        let Some(source) = &self.source else {
            return Err(NestError::CarrierNotSet);
        };
        let opening_key = match (&self.private_key, self.password.as_str()) {
            (Some(private_key), _) => OpeningKey::PrivateKey(private_key),
            (None, Some(password)) => OpeningKey::Passphrase(password),
            (None, None) => {
                return Err(NestError::MissingKey(
                    "a passphrase or a private key is needed to open the payload",
                ))
            }
        };
        let stego_key = resolve_stego_key(self.stego_key.clone(), &self.password)?;

        let media = Media::from_file(source, &self.options)?;
        let combined = envelope::read_container(&media, &stego_key)?;

        envelope::open(&combined, &opening_key)
    }

    fn record_success(&self, output: Option<&Path>, payload_len: usize) {
        if let Some(source) = &self.source {
            info!("unveiled {payload_len} bytes from {source:?}");
            self.events
                .record(&OperationEvent::extracted(source, output, payload_len));
        }
    }

    fn record_failure(&self, e: NestError) -> NestError {
        self.events
            .record(&OperationEvent::extract_failed(self.source.as_deref(), &e));
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Action, MemorySink};
    use crate::media::text::TextCarrier;
    use crate::media::{Carrier, Persist};
    use nest_crypto::KdfParams;
    use tempfile::tempdir;

    fn fast_kdf() -> KdfParams {
        KdfParams::default()
            .with_time_cost(1)
            .with_memory_cost(1024)
            .with_parallelism(1)
    }

    fn hide_in_text(dir: &Path, payload: &[u8], password: &str) -> PathBuf {
        let combined = envelope::seal(
            payload,
            &envelope::SealingKey::Passphrase(password),
            &fast_kdf(),
        )
        .unwrap();
        let words = (0..combined.len() * 8)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let mut carrier = TextCarrier::new(words);
        carrier
            .embed(&combined, &StegoKey::from_passphrase(password))
            .unwrap();
        let file = dir.join("stego.txt");
        carrier.save_as(&file).unwrap();
        file
    }

    #[test]
    fn illustrate_api_usage() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let stego = hide_in_text(temp_dir.path(), b"Hello, World!", "SuperSecret42");

        let output = crate::api::extract::prepare()
            .from_secret_file(&stego)
            .with_password("SuperSecret42")
            .into_output_file(temp_dir.path().join("secret.txt"))
            .execute()
            .expect("Failed to unveil message");

        assert_eq!(std::fs::read(output).unwrap(), b"Hello, World!");
    }

    #[test]
    fn reveal_records_events_without_output() {
        let temp_dir = tempdir().unwrap();
        let stego = hide_in_text(temp_dir.path(), b"abc", "pw");
        let events = Arc::new(MemorySink::default());

        let payload = prepare()
            .from_secret_file(&stego)
            .with_password("pw")
            .with_event_sink(events.clone())
            .reveal()
            .unwrap();

        assert_eq!(payload.as_slice(), b"abc");
        let recorded = events.events();
        assert_eq!(recorded[0].action, Action::Extract);
        assert_eq!(recorded[0].output, None);
        assert_eq!(recorded[0].payload_len, Some(3));
    }

    #[test]
    fn failures_write_nothing() {
        let temp_dir = tempdir().unwrap();
        let stego = hide_in_text(temp_dir.path(), b"abc", "pw");
        let output = temp_dir.path().join("secret.txt");
        let events = Arc::new(MemorySink::default());

        let result = prepare()
            .from_secret_file(&stego)
            .with_password("pw")
            .with_stego_key(StegoKey::from([0u8; 32]))
            .into_output_file(&output)
            .with_event_sink(events.clone())
            .execute();

        assert!(matches!(result, Err(NestError::Format(_))));
        assert!(!output.exists());
        assert_eq!(events.events()[0].action, Action::ExtractFailed);
    }
}
