//! Sealing payloads into containers and opening them again.

use log::debug;
use nest_crypto::{
    decrypt, derive_key, encrypt, random_bytes, unwrap_key, wrap_key, KdfParams, RsaPrivateKey,
    RsaPublicKey, SecretBytes, KEY_LEN, SALT_LEN, TAG_LEN,
};
use zeroize::Zeroizing;

use crate::container::{peek_total_header_len, ContainerHeader, PREFIX_LEN};
use crate::error::NestError;
use crate::media::Carrier;
use crate::result::Result;
use crate::StegoKey;

/// Bound to every ciphertext as associated data
pub const ASSOCIATED_DATA: &[u8] = b"NE-stego";

/// Key material for sealing
#[derive(Debug, Clone, Copy)]
pub enum SealingKey<'a> {
    /// the encryption key is derived with argon2id
    Passphrase(&'a str),
    /// a random data key is wrapped for the holder of the matching private key
    Recipient(&'a RsaPublicKey),
}

/// Key material for opening, must match the kind used for sealing
#[derive(Clone, Copy)]
pub enum OpeningKey<'a> {
    Passphrase(&'a str),
    PrivateKey(&'a RsaPrivateKey),
}

/// Encrypts `plaintext` and prefixes the container header, the result is what carriers embed.
pub fn seal(plaintext: &[u8], key: &SealingKey, kdf: &KdfParams) -> Result<Vec<u8>> {
    let (data_key, salt, wrapped_key) = match key {
        SealingKey::Passphrase(passphrase) => {
            let (data_key, salt) = derive_key(passphrase.as_bytes(), None, kdf)?;
            (data_key, salt, None)
        }
        SealingKey::Recipient(public_key) => {
            let data_key = Zeroizing::new(random_bytes::<KEY_LEN>().to_vec());
            let wrapped = wrap_key(public_key, &data_key)?;
            (data_key, random_bytes::<SALT_LEN>(), Some(wrapped))
        }
    };

    let (nonce, ciphertext) = encrypt(&data_key, plaintext, ASSOCIATED_DATA)?;
    let ciphertext_len = u32::try_from(ciphertext.len() - TAG_LEN)
        .map_err(|_| NestError::Format("payload too large for a container".to_string()))?;
    let header = ContainerHeader {
        kdf: *kdf,
        salt,
        nonce,
        wrapped_key,
        ciphertext_len,
    };

    let mut combined = header.build()?;
    combined.extend_from_slice(&ciphertext);

    Ok(combined)
}

/// Parses, authenticates and decrypts a combined stream, trailing bytes are ignored.
pub fn open(combined: &[u8], key: &OpeningKey) -> Result<SecretBytes> {
    let (header, offset) = ContainerHeader::parse(combined)?;
    let end = offset + container_body_len(&header);
    if combined.len() < end {
        return Err(NestError::Format(format!(
            "container declares {end} bytes but only {} are available",
            combined.len()
        )));
    }

    let data_key = match (key, &header.wrapped_key) {
        (OpeningKey::Passphrase(passphrase), None) => {
            derive_key(passphrase.as_bytes(), Some(&header.salt), &header.kdf)?.0
        }
        (OpeningKey::PrivateKey(private_key), Some(wrapped)) => unwrap_key(private_key, wrapped)?,
        (OpeningKey::Passphrase(_), Some(_)) => {
            return Err(NestError::MissingKey(
                "the container is sealed for a private key, not a passphrase",
            ))
        }
        (OpeningKey::PrivateKey(_), None) => {
            return Err(NestError::MissingKey(
                "the container is sealed with a passphrase, not a key pair",
            ))
        }
    };

    Ok(decrypt(
        &data_key,
        &header.nonce,
        &combined[offset..end],
        ASSOCIATED_DATA,
    )?)
}

/// ciphertext plus tag
fn container_body_len(header: &ContainerHeader) -> usize {
    header.ciphertext_len as usize + TAG_LEN
}

/// Reads a whole container from a carrier.
///
/// Positions for a key are prefix stable, so the fixed prefix, then the full header,
/// then the full container are read by extracting ever longer streams.
pub fn read_container<C: Carrier + ?Sized>(carrier: &C, key: &StegoKey) -> Result<Vec<u8>> {
    let capacity = carrier.capacity(key) / 8;
    if capacity < PREFIX_LEN {
        return Err(NestError::Format(
            "carrier is too small to hold a container".to_string(),
        ));
    }

    let prefix = carrier.extract(key, PREFIX_LEN)?;
    let header_len = peek_total_header_len(&prefix)?;
    if header_len > capacity {
        return Err(NestError::Format(format!(
            "header of {header_len} bytes exceeds the carrier capacity of {capacity} bytes"
        )));
    }

    let (header, _) = ContainerHeader::parse(&carrier.extract(key, header_len)?)?;
    let total = header_len + container_body_len(&header);
    if total > capacity {
        return Err(NestError::Format(format!(
            "container of {total} bytes exceeds the carrier capacity of {capacity} bytes"
        )));
    }
    debug!("reading container of {total} bytes, header {header_len} bytes");

    carrier.extract(key, total)
}

/// Largest passphrase sealed payload that fits into `capacity_bits`.
///
/// The header is sized with a `ciphertext_len` of the full capacity, which makes this a lower
/// bound of what actually fits.
pub fn max_payload_len(capacity_bits: usize, kdf: &KdfParams) -> Result<usize> {
    let capacity = capacity_bits / 8;
    let header = ContainerHeader {
        kdf: *kdf,
        salt: [0; SALT_LEN],
        nonce: [0; nest_crypto::NONCE_LEN],
        wrapped_key: None,
        ciphertext_len: u32::try_from(capacity).unwrap_or(u32::MAX),
    };
    let overhead = header.build()?.len() + TAG_LEN;

    Ok(capacity.saturating_sub(overhead))
}
