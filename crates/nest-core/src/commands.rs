use std::fmt::{self, Display, Formatter};
use std::path::Path;

use nest_crypto::KdfParams;

use crate::envelope;
use crate::media::{Carrier, CarrierOptions, Media};
use crate::{Result, StegoKey};

/// What a carrier can take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    pub kind: &'static str,
    pub bits: usize,
    /// usable payload of a passphrase sealed container, after header and tag
    pub payload_bytes: usize,
}

impl CapacityReport {
    pub fn bytes(&self) -> usize {
        self.bits / 8
    }
}

impl Display for CapacityReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} carrier: {} bits ({} bytes), up to {} payload bytes",
            self.kind,
            self.bits,
            self.bytes(),
            self.payload_bytes
        )
    }
}

/// Estimates the capacity of `carrier`, the key only matters for video frame selection.
pub fn capacity(
    carrier: &Path,
    key: &StegoKey,
    options: &CarrierOptions,
    kdf: &KdfParams,
) -> Result<CapacityReport> {
    let media = Media::from_file(carrier, options)?;
    let bits = media.capacity(key);

    Ok(CapacityReport {
        kind: media.kind(),
        bits,
        payload_bytes: envelope::max_payload_len(bits, kdf)?,
    })
}
