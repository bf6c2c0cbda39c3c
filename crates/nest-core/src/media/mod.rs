use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use enum_dispatch::enum_dispatch;
use log::{debug, error};
use tempfile::NamedTempFile;

use crate::capacity;
use crate::error::NestError;
use crate::result::Result;
use crate::universal_decoder::Decoder;
use crate::universal_encoder::Encoder;
use crate::StegoKey;

pub mod audio;
pub mod codec_options;
pub mod image;
pub mod text;
pub mod video;

/// Common contract of all carrier engines.
///
/// `embed` and `extract` check the capacity first and fail with
/// [`NestError::CapacityExceeded`](crate::NestError::CapacityExceeded) before anything is touched.
#[enum_dispatch]
pub trait Carrier {
    /// Embeddable bits. Only video depends on the key, it selects frames with it.
    fn capacity(&self, key: &StegoKey) -> usize;

    fn embed(&mut self, data: &[u8], key: &StegoKey) -> Result<()>;

    fn extract(&self, key: &StegoKey, len: usize) -> Result<Vec<u8>>;
}

mod primitives;
mod types;

pub use codec_options::{AudioOptions, CarrierOptions, ImageOptions, VideoOptions};
pub use primitives::*;
pub use types::*;

pub trait Persist {
    fn save_as(&mut self, _: &Path) -> Result<()>;
}

/// Writes through a temporary file next to `target` and moves it into place when `write`
/// succeeded, an error leaves `target` untouched.
pub(crate) fn persist_atomically<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Error creating temporary file in {dir:?}: {e}");
        NestError::WriteError { source: e }
    })?;
    write(staged.as_file_mut())?;
    staged.persist(target).map_err(|e| {
        error!("Error persisting {target:?}: {}", e.error);
        NestError::WriteError { source: e.error }
    })?;

    Ok(())
}

/// hides `data` on pseudorandom `units`, after checking it fits into `capacity` bits
pub(crate) fn hide_data<U: HideBit + ?Sized>(
    units: &mut U,
    capacity: usize,
    data: &[u8],
    key: &StegoKey,
) -> Result<()> {
    capacity::ensure_fits(data.len(), capacity)?;
    debug!(
        "hiding {} bits on {} units, capacity {capacity} bits",
        data.len() * 8,
        units.unit_count()
    );
    Encoder::new(units, key).write_all(data)?;

    Ok(())
}

/// reads `len` bytes back from the units `hide_data` has picked for the same key
pub(crate) fn unveil_data<U: UnveilBit + ?Sized>(
    units: &U,
    capacity: usize,
    len: usize,
    key: &StegoKey,
) -> Result<Vec<u8>> {
    capacity::ensure_fits(len, capacity)?;
    let mut data = vec![0u8; len];
    Decoder::new(units, key).read_exact(&mut data)?;

    Ok(data)
}
