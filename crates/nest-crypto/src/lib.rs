//! # Nest Crypto
//! Primitives used by `nest-core`: Argon2id key derivation, AES-256-GCM
//! authenticated encryption and RSA-OAEP key wrapping.
//!
//! All secret outputs are returned in [`Zeroizing`] buffers, they are wiped when dropped.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

pub mod error;
mod wrap;

pub use crate::error::CryptoError;
pub use wrap::*;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;
pub const TAG_LEN: usize = 16;

pub type Result<T> = std::result::Result<T, CryptoError>;
pub type Salt = [u8; SALT_LEN];
pub type NonceBytes = [u8; NONCE_LEN];
pub type SecretBytes = Zeroizing<Vec<u8>>;

/// Argon2id parameters, stored in the container header so an extractor can
/// re-derive the very same key.
///
/// Field order is alphabetical, serializers emit them in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Output length in bytes
    pub hash_len: u32,
    /// Memory cost in KiB
    pub memory_cost: u32,
    pub parallelism: u32,
    /// Number of iterations
    pub time_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            hash_len: KEY_LEN as u32,
            memory_cost: 1 << 18,
            parallelism: 4,
            time_cost: 4,
        }
    }
}

impl KdfParams {
    pub fn with_time_cost(mut self, time_cost: u32) -> Self {
        self.time_cost = time_cost;
        self
    }

    pub fn with_memory_cost(mut self, memory_cost: u32) -> Self {
        self.memory_cost = memory_cost;
        self
    }

    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_hash_len(mut self, hash_len: u32) -> Self {
        self.hash_len = hash_len;
        self
    }

    fn argon2<'key>(&self) -> Result<Argon2<'key>> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_len as usize),
        )
        .map_err(CryptoError::KdfError)?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// fills a fresh array with bytes from the OS random number generator
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    OsRng.fill_bytes(&mut out);
    out
}

/// derives a key from `password` with argon2id.
///
/// A fresh random salt is generated when `salt` is `None`, the used salt is returned alongside the key.
pub fn derive_key(
    password: &[u8],
    salt: Option<&Salt>,
    params: &KdfParams,
) -> Result<(SecretBytes, Salt)> {
    let salt = match salt {
        Some(salt) => *salt,
        None => random_bytes::<SALT_LEN>(),
    };
    let mut key = Zeroizing::new(vec![0u8; params.hash_len as usize]);
    params
        .argon2()?
        .hash_password_into(password, &salt, &mut key)
        .map_err(CryptoError::KdfError)?;

    Ok((key, salt))
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::KeyLengthError {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::KeyLengthError {
        expected: KEY_LEN,
        actual: key.len(),
    })
}

/// encrypts `plaintext` with AES-256-GCM under a freshly generated nonce.
///
/// Returns the nonce and the ciphertext with the 16 byte tag appended.
pub fn encrypt(
    key: &[u8],
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<(NonceBytes, Vec<u8>)> {
    let cipher = cipher(key)?;
    let nonce = random_bytes::<NONCE_LEN>();
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(CryptoError::EncryptionError)?;

    Ok((nonce, ciphertext))
}

/// decrypts and authenticates `ciphertext` (including its tag).
///
/// Nothing is returned unless the tag verifies.
pub fn decrypt(
    key: &[u8],
    nonce: &NonceBytes,
    ciphertext: &[u8],
    associated_data: &[u8],
) -> Result<SecretBytes> {
    let cipher = cipher(key)?;
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: associated_data,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::AuthenticationError)
}

/// Best-effort zeroing of a buffer.
///
/// Copies the data may have left behind (reallocations, moves, swap) are not covered,
/// this is not a security boundary.
pub fn secure_wipe(buffer: &mut [u8]) {
    buffer.zeroize();
}
