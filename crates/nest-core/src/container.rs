//! The self-describing container that is hidden in a carrier.
//!
//! ```text
//! offset 0              magic "NEST"
//! offset 4              version (1)
//! offset 5              header length, u32 big-endian
//! offset 9              canonical JSON metadata
//! offset 9 + length     ciphertext || 16 byte GCM tag
//! ```
//!
//! The metadata is serialized with sorted keys and without whitespace, byte fields are hex.
//! `ciphertext_len` counts the ciphertext without its tag.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use nest_crypto::{KdfParams, NonceBytes, Salt, NONCE_LEN, SALT_LEN};
use serde::{Deserialize, Serialize};

use crate::error::NestError;
use crate::result::Result;

pub const MAGIC: &[u8; 4] = b"NEST";
pub const VERSION: u8 = 1;
/// magic, version and header length
pub const PREFIX_LEN: usize = 9;

/// Upper bounds for kdf parameters read from untrusted input, 4 GiB of memory at most
pub const MAX_MEMORY_COST: u32 = 1 << 22;
pub const MAX_TIME_COST: u32 = 64;
pub const MAX_PARALLELISM: u32 = 64;
pub const MAX_HASH_LEN: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub kdf: KdfParams,
    pub salt: Salt,
    pub nonce: NonceBytes,
    /// the data key wrapped for a recipient, `None` for passphrase containers
    pub wrapped_key: Option<Vec<u8>>,
    pub ciphertext_len: u32,
}

/// Wire form of the metadata, fields in lexicographic order.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Metadata {
    ciphertext_len: u32,
    kdf: KdfParams,
    nonce: String,
    salt: String,
    wrapped_key: Option<String>,
}

impl ContainerHeader {
    pub fn build(&self) -> Result<Vec<u8>> {
        let metadata = Metadata {
            ciphertext_len: self.ciphertext_len,
            kdf: self.kdf,
            nonce: hex::encode(self.nonce),
            salt: hex::encode(self.salt),
            wrapped_key: self.wrapped_key.as_ref().map(hex::encode),
        };
        let json = serde_json::to_vec(&metadata)
            .map_err(|e| NestError::Format(format!("cannot serialize metadata: {e}")))?;
        let header_len = u32::try_from(json.len())
            .map_err(|_| NestError::Format("metadata too large".to_string()))?;

        let mut out = Vec::with_capacity(PREFIX_LEN + json.len());
        out.extend_from_slice(MAGIC);
        out.write_u8(VERSION)?;
        out.write_u32::<BigEndian>(header_len)?;
        out.extend_from_slice(&json);

        Ok(out)
    }

    /// Parses a header from the start of `bytes`, returns it with the number of bytes it spans.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize)> {
        let total = peek_total_header_len(bytes)?;
        if bytes.len() < total {
            return Err(NestError::Format(format!(
                "header declares {total} bytes but only {} are available",
                bytes.len()
            )));
        }

        let metadata: Metadata = serde_json::from_slice(&bytes[PREFIX_LEN..total])
            .map_err(|e| NestError::Format(format!("undecodable metadata: {e}")))?;
        check_kdf_bounds(&metadata.kdf)?;
        let header = Self {
            kdf: metadata.kdf,
            salt: fixed_hex::<SALT_LEN>("salt", &metadata.salt)?,
            nonce: fixed_hex::<NONCE_LEN>("nonce", &metadata.nonce)?,
            wrapped_key: metadata
                .wrapped_key
                .map(|k| hex::decode(k).map_err(|e| bad_hex("wrapped_key", e)))
                .transpose()?,
            ciphertext_len: metadata.ciphertext_len,
        };

        Ok((header, total))
    }
}

/// Validates the fixed prefix and returns the length of the whole header including it.
pub fn peek_total_header_len(prefix: &[u8]) -> Result<usize> {
    if prefix.len() < PREFIX_LEN {
        return Err(NestError::Format(format!(
            "container needs at least {PREFIX_LEN} bytes, got {}",
            prefix.len()
        )));
    }

    let mut reader = Cursor::new(prefix);
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(NestError::Format("magic mismatch".to_string()));
    }
    let version = reader.read_u8()?;
    if version != VERSION {
        return Err(NestError::Format(format!("unsupported version {version}")));
    }
    let header_len = reader.read_u32::<BigEndian>()? as usize;

    Ok(PREFIX_LEN + header_len)
}

/// Refuses kdf parameters that would make key derivation exhaust the machine.
pub fn check_kdf_bounds(kdf: &KdfParams) -> Result<()> {
    let limits = [
        ("memory_cost", kdf.memory_cost, MAX_MEMORY_COST),
        ("time_cost", kdf.time_cost, MAX_TIME_COST),
        ("parallelism", kdf.parallelism, MAX_PARALLELISM),
        ("hash_len", kdf.hash_len, MAX_HASH_LEN),
    ];
    for (name, value, max) in limits {
        if value > max {
            return Err(NestError::Format(format!(
                "kdf {name} of {value} exceeds the limit of {max}"
            )));
        }
    }

    Ok(())
}

fn fixed_hex<const N: usize>(field: &str, value: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(value).map_err(|e| bad_hex(field, e))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        NestError::Format(format!("{field} must be {N} bytes, got {len}"))
    })
}

fn bad_hex(field: &str, e: hex::FromHexError) -> NestError {
    NestError::Format(format!("{field} is not valid hex: {e}"))
}
