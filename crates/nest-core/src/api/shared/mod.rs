mod password;

pub use password::*;

use crate::error::NestError;
use crate::result::Result;
use crate::StegoKey;

/// an explicit stego key wins, otherwise it is derived from the passphrase
pub(crate) fn resolve_stego_key(explicit: Option<StegoKey>, password: &Password) -> Result<StegoKey> {
    match (explicit, password.as_str()) {
        (Some(key), _) => Ok(key),
        (None, Some(password)) => Ok(StegoKey::from_passphrase(password)),
        (None, None) => Err(NestError::MissingKey(
            "a stego key or a passphrase is needed to locate the payload",
        )),
    }
}
