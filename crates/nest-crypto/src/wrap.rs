//! RSA-OAEP (SHA-256) envelope for symmetric keys.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::Oaep;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{CryptoError, Result, SecretBytes};

pub use rsa::{RsaPrivateKey, RsaPublicKey};

pub const DEFAULT_RSA_BITS: usize = 4096;

/// encrypts `raw_key` for the holder of the private half of `public_key`
pub fn wrap_key(public_key: &RsaPublicKey, raw_key: &[u8]) -> Result<Vec<u8>> {
    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), raw_key)
        .map_err(CryptoError::WrapError)
}

/// recovers a key wrapped by [`wrap_key`]
pub fn unwrap_key(private_key: &RsaPrivateKey, wrapped: &[u8]) -> Result<SecretBytes> {
    private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map(Zeroizing::new)
        .map_err(CryptoError::UnwrapError)
}

/// generates a fresh key pair, returned as (PKCS#8 private PEM, SPKI public PEM)
pub fn generate_rsa_keypair(bits: usize) -> Result<(Zeroizing<String>, String)> {
    let private_key = RsaPrivateKey::new(&mut OsRng, bits).map_err(CryptoError::WrapError)?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyFormatError(e.to_string()))?;
    let public_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyFormatError(e.to_string()))?;

    Ok((private_pem, public_pem))
}

pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| CryptoError::KeyFormatError(e.to_string()))
}

pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| CryptoError::KeyFormatError(e.to_string()))
}
