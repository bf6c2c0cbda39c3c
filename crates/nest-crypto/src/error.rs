pub use aes_gcm::Error as AesGcmError;
pub use argon2::Error as Argon2Error;
pub use rsa::Error as RsaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Argon2id rejected the given parameters or inputs
    #[error("Key derivation error: {0}")]
    KdfError(Argon2Error),

    /// Symmetric keys must be exactly 32 bytes for AES-256-GCM
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    KeyLengthError { expected: usize, actual: usize },

    /// Tag verification failed, the key, nonce, associated data or ciphertext do not match
    #[error("Authentication failed: wrong key or tampered data")]
    AuthenticationError,

    #[error("Encryption error")]
    EncryptionError(AesGcmError),

    #[error("Key wrap error: {0}")]
    WrapError(RsaError),

    #[error("Key unwrap error: {0}")]
    UnwrapError(RsaError),

    /// A PEM encoded key could not be read or written
    #[error("Key format error: {0}")]
    KeyFormatError(String),
}
