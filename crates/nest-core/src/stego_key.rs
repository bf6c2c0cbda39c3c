use std::fmt::{self, Debug, Formatter};

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

pub const STEGO_KEY_LEN: usize = 32;

/// The key that decides *where* bits are hidden, as opposed to the encryption key
/// that decides *what* is hidden.
///
/// Lives for a single embed or extract operation and is wiped on drop.
#[derive(Clone)]
pub struct StegoKey(Zeroizing<[u8; STEGO_KEY_LEN]>);

impl StegoKey {
    /// SHA-256 of the passphrase
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest: [u8; STEGO_KEY_LEN] = Sha256::digest(passphrase.as_bytes()).into();
        Self(Zeroizing::new(digest))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl From<[u8; STEGO_KEY_LEN]> for StegoKey {
    fn from(bytes: [u8; STEGO_KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }
}

impl Debug for StegoKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "StegoKey({})", "*".repeat(STEGO_KEY_LEN))
    }
}
