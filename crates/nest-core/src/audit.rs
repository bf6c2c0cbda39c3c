//! Encrypted, append-only log of operation events.
//!
//! ```text
//! "NESL" | salt (16) | hash_len | memory_cost | parallelism | time_cost   (u32 BE each)
//! then per record:  nonce_len (1) | nonce | ct_len (u32 BE) | ct
//! ```
//!
//! Each `ct` is the AES-256-GCM encryption of one JSON encoded [`AuditRecord`] under a key
//! derived from the admin password. Only the admin password can read the log back.

use std::fs::{self, OpenOptions};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, error};
use nest_crypto::{decrypt, derive_key, encrypt, KdfParams, NonceBytes, Salt, SecretBytes};
use serde::{Deserialize, Serialize};

use crate::container::check_kdf_bounds;
use crate::error::NestError;
use crate::events::{EventSink, OperationEvent};
use crate::result::Result;

pub const LOG_MAGIC: &[u8; 4] = b"NESL";
const LOG_HEADER_LEN: usize = 4 + 16 + 4 * 4;
/// a single JSON event never comes close
const MAX_RECORD_LEN: usize = 1 << 20;

/// A decrypted log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// unix seconds
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: OperationEvent,
}

pub struct SecureEventLog {
    path: PathBuf,
    key: SecretBytes,
}

impl SecureEventLog {
    /// Opens an existing log, or starts a new one with a fresh salt.
    pub fn open_or_create(path: &Path, admin_password: &str, kdf: &KdfParams) -> Result<Self> {
        if path.exists() {
            let bytes = fs::read(path).map_err(|e| NestError::ReadError { source: e })?;
            let (salt, stored_kdf) = parse_log_header(&bytes)?;
            let (key, _) = derive_key(admin_password.as_bytes(), Some(&salt), &stored_kdf)?;
            return Ok(Self {
                path: path.to_path_buf(),
                key,
            });
        }

        let (key, salt) = derive_key(admin_password.as_bytes(), None, kdf)?;
        let mut header = Vec::with_capacity(LOG_HEADER_LEN);
        header.extend_from_slice(LOG_MAGIC);
        header.extend_from_slice(&salt);
        for value in [kdf.hash_len, kdf.memory_cost, kdf.parallelism, kdf.time_cost] {
            header.write_u32::<BigEndian>(value)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| NestError::WriteError { source: e })?;
        file.write_all(&header)
            .map_err(|e| NestError::WriteError { source: e })?;
        debug!("started audit log {path:?}");

        Ok(Self {
            path: path.to_path_buf(),
            key,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &OperationEvent) -> Result<()> {
        let record = AuditRecord {
            timestamp: unix_now(),
            event: event.clone(),
        };
        let json = serde_json::to_vec(&record)
            .map_err(|e| NestError::Format(format!("cannot serialize audit record: {e}")))?;
        let (nonce, ct) = encrypt(&self.key, &json, LOG_MAGIC)?;
        let ct_len = u32::try_from(ct.len())
            .map_err(|_| NestError::Format("audit record too large".to_string()))?;

        let mut entry = Vec::with_capacity(1 + nonce.len() + 4 + ct.len());
        entry.write_u8(nonce.len() as u8)?;
        entry.extend_from_slice(&nonce);
        entry.write_u32::<BigEndian>(ct_len)?;
        entry.extend_from_slice(&ct);

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| NestError::WriteError { source: e })?;
        file.write_all(&entry)
            .map_err(|e| NestError::WriteError { source: e })
    }

    /// Decrypts every record of the log at `path`.
    pub fn read_all(path: &Path, admin_password: &str) -> Result<Vec<AuditRecord>> {
        let bytes = fs::read(path).map_err(|e| NestError::ReadError { source: e })?;
        let (salt, kdf) = parse_log_header(&bytes)?;
        let (key, _) = derive_key(admin_password.as_bytes(), Some(&salt), &kdf)?;

        let mut reader = Cursor::new(&bytes[LOG_HEADER_LEN..]);
        let mut records = Vec::new();
        while (reader.position() as usize) < reader.get_ref().len() {
            let (nonce, ct) = read_entry(&mut reader)?;
            let json = decrypt(&key, &nonce, &ct, LOG_MAGIC)?;
            let record = serde_json::from_slice(&json)
                .map_err(|e| NestError::Format(format!("undecodable audit record: {e}")))?;
            records.push(record);
        }

        Ok(records)
    }
}

impl EventSink for SecureEventLog {
    fn record(&self, event: &OperationEvent) {
        if let Err(e) = self.append(event) {
            error!("Error appending to audit log {:?}: {e}", self.path);
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn parse_log_header(bytes: &[u8]) -> Result<(Salt, KdfParams)> {
    if bytes.len() < LOG_HEADER_LEN || &bytes[..4] != LOG_MAGIC {
        return Err(NestError::Format("not an audit log".to_string()));
    }
    let mut reader = Cursor::new(&bytes[4..LOG_HEADER_LEN]);
    let mut salt = Salt::default();
    reader.read_exact(&mut salt)?;
    let kdf = KdfParams {
        hash_len: reader.read_u32::<BigEndian>()?,
        memory_cost: reader.read_u32::<BigEndian>()?,
        parallelism: reader.read_u32::<BigEndian>()?,
        time_cost: reader.read_u32::<BigEndian>()?,
    };
    check_kdf_bounds(&kdf)?;

    Ok((salt, kdf))
}

fn read_entry(reader: &mut Cursor<&[u8]>) -> Result<(NonceBytes, Vec<u8>)> {
    let truncated = |_| NestError::Format("truncated audit record".to_string());

    let nonce_len = reader.read_u8().map_err(truncated)? as usize;
    let mut nonce = NonceBytes::default();
    if nonce_len != nonce.len() {
        return Err(NestError::Format(format!(
            "unexpected nonce length {nonce_len}"
        )));
    }
    reader.read_exact(&mut nonce).map_err(truncated)?;
    let ct_len = reader.read_u32::<BigEndian>().map_err(truncated)? as usize;
    if ct_len > MAX_RECORD_LEN {
        return Err(NestError::Format(format!(
            "audit record of {ct_len} bytes exceeds the limit of {MAX_RECORD_LEN}"
        )));
    }
    let remaining = reader.get_ref().len() - reader.position() as usize;
    if ct_len > remaining {
        return Err(NestError::Format("truncated audit record".to_string()));
    }
    let mut ct = vec![0u8; ct_len];
    reader.read_exact(&mut ct).map_err(truncated)?;

    Ok((nonce, ct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_crypto::CryptoError;
    use tempfile::TempDir;

    fn fast_kdf() -> KdfParams {
        KdfParams::default()
            .with_time_cost(1)
            .with_memory_cost(1024)
            .with_parallelism(1)
    }

    #[test]
    fn records_are_read_back_with_the_admin_password() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.nesl");
        let log = SecureEventLog::open_or_create(&path, "admin", &fast_kdf()).unwrap();
        log.record(&OperationEvent::embedded(
            Path::new("cover.png"),
            Path::new("out.png"),
            5,
        ));
        drop(log);

        // reopening keeps appending to the same log
        let log = SecureEventLog::open_or_create(&path, "admin", &fast_kdf()).unwrap();
        log.record(&OperationEvent::extract_failed(None, &"magic mismatch"));

        let records = SecureEventLog::read_all(&path, "admin").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event.payload_len, Some(5));
        assert_eq!(records[1].event.error.as_deref(), Some("magic mismatch"));
        assert!(records[0].timestamp > 0);
    }

    #[test]
    fn records_are_not_readable_without_the_password() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.nesl");
        let log = SecureEventLog::open_or_create(&path, "admin", &fast_kdf()).unwrap();
        log.append(&OperationEvent::embedded(
            Path::new("secret-plans.png"),
            Path::new("out.png"),
            5,
        ))
        .unwrap();

        let raw = fs::read(&path).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("secret-plans"));
        assert!(matches!(
            SecureEventLog::read_all(&path, "not admin"),
            Err(NestError::Crypto(CryptoError::AuthenticationError))
        ));
    }

    #[test]
    fn truncated_logs_are_format_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.nesl");
        let log = SecureEventLog::open_or_create(&path, "admin", &fast_kdf()).unwrap();
        log.append(&OperationEvent::extracted(Path::new("a.wav"), None, 1))
            .unwrap();

        let raw = fs::read(&path).unwrap();
        fs::write(&path, &raw[..raw.len() - 3]).unwrap();
        assert!(matches!(
            SecureEventLog::read_all(&path, "admin"),
            Err(NestError::Format(_))
        ));
        assert!(matches!(
            SecureEventLog::read_all(Path::new("Cargo.toml"), "admin"),
            Err(NestError::Format(_))
        ));
    }

    #[test]
    fn oversized_lengths_are_format_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.nesl");
        drop(SecureEventLog::open_or_create(&path, "admin", &fast_kdf()).unwrap());

        let mut raw = fs::read(&path).unwrap();
        raw.push(12);
        raw.extend_from_slice(&[0u8; 12]);
        raw.extend_from_slice(&u32::MAX.to_be_bytes());
        fs::write(&path, &raw).unwrap();
        assert!(matches!(
            SecureEventLog::read_all(&path, "admin"),
            Err(NestError::Format(msg)) if msg.contains("exceeds")
        ));

        // memory_cost sits right after the magic, the salt and hash_len
        let mut raw = fs::read(&path).unwrap();
        raw[24..28].copy_from_slice(&u32::MAX.to_be_bytes());
        fs::write(&path, &raw).unwrap();
        assert!(matches!(
            SecureEventLog::read_all(&path, "admin"),
            Err(NestError::Format(msg)) if msg.contains("memory_cost")
        ));
    }
}
