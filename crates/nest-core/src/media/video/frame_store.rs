use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use log::{debug, error};

use crate::error::NestError;
use crate::result::Result;

/// Exchanges decoded video frames with the outside world, container and codec
/// handling lives behind this trait.
pub trait FrameStore {
    fn read_frames(&self, source: &Path) -> Result<Vec<RgbImage>>;

    fn write_frames(&self, frames: &[&RgbImage], target: &Path) -> Result<()>;
}

/// A directory of numbered PNG frames, e.g. `frame_000001.png`.
///
/// Frames are ordered by the number in their file name. Writing goes to a hidden
/// sibling directory first that replaces `target` only once every frame is written.
/// An existing `target` is only replaced when it holds nothing but frames written here.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngFrameDirectory;

impl PngFrameDirectory {
    fn frame_name(index: usize) -> String {
        format!("frame_{:06}.png", index + 1)
    }

    fn staging_dir(target: &Path) -> Result<PathBuf> {
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(NestError::TargetNotSet)?;

        Ok(target.with_file_name(format!(".{name}.partial")))
    }

    fn backup_dir(target: &Path) -> Result<PathBuf> {
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(NestError::TargetNotSet)?;

        Ok(target.with_file_name(format!(".{name}.previous")))
    }

    fn is_frame_name(name: &str) -> bool {
        name.strip_prefix("frame_")
            .and_then(|rest| rest.strip_suffix(".png"))
            .is_some_and(|digits| digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()))
    }

    /// an existing target must be a directory of frames, anything else is left alone
    fn ensure_replaceable(target: &Path) -> Result<()> {
        if !target.exists() {
            return Ok(());
        }
        let refuse = |reason: &str| {
            error!("Refusing to replace {target:?}: {reason}");
            NestError::WriteError {
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} {reason}", target.display()),
                ),
            }
        };
        if !target.is_dir() {
            return Err(refuse("is not a frame directory"));
        }

        let entries = fs::read_dir(target).map_err(|e| NestError::ReadError { source: e })?;
        for entry in entries {
            let entry = entry.map_err(|e| NestError::ReadError { source: e })?;
            let is_file = entry
                .file_type()
                .map_err(|e| NestError::ReadError { source: e })?
                .is_file();
            let name = entry.file_name();
            if !is_file || !name.to_str().is_some_and(Self::is_frame_name) {
                return Err(refuse("contains files other than frames"));
            }
        }
        Ok(())
    }
}

/// the number in a frame file name, files without one sort last
fn frame_number(path: &Path) -> (u64, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits: String = stem.chars().filter(char::is_ascii_digit).collect();

    (digits.parse().unwrap_or(u64::MAX), stem)
}

impl FrameStore for PngFrameDirectory {
    fn read_frames(&self, source: &Path) -> Result<Vec<RgbImage>> {
        let entries = fs::read_dir(source).map_err(|e| {
            error!("Error reading frame directory {source:?}: {e}");
            NestError::InvalidVideoMedia
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| NestError::ReadError { source: e })?.path();
            let is_png = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"));
            if is_png {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(NestError::InvalidVideoMedia);
        }
        files.sort_by_cached_key(|p| frame_number(p));
        debug!("reading {} frames from {source:?}", files.len());

        files
            .iter()
            .map(|file| {
                image::open(file)
                    .map(|frame| frame.to_rgb8())
                    .map_err(|e| {
                        error!("Error opening frame {file:?}: {e}");
                        NestError::InvalidVideoMedia
                    })
            })
            .collect()
    }

    fn write_frames(&self, frames: &[&RgbImage], target: &Path) -> Result<()> {
        Self::ensure_replaceable(target)?;
        let staging = Self::staging_dir(target)?;
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| NestError::WriteError { source: e })?;
        }
        fs::create_dir_all(&staging).map_err(|e| NestError::WriteError { source: e })?;

        for (index, frame) in frames.iter().enumerate() {
            let file = staging.join(Self::frame_name(index));
            if let Err(e) = frame.save_with_format(&file, ImageFormat::Png) {
                error!("Error saving frame {file:?}: {e}");
                // best effort, the staging directory is of no use anymore
                let _ = fs::remove_dir_all(&staging);
                return Err(NestError::ImageEncodingError);
            }
        }

        // the old frames stay aside until the new ones are in place
        let backup = if target.exists() {
            let backup = Self::backup_dir(target)?;
            if backup.exists() {
                fs::remove_dir_all(&backup).map_err(|e| NestError::WriteError { source: e })?;
            }
            fs::rename(target, &backup).map_err(|e| NestError::WriteError { source: e })?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(&staging, target) {
            error!("Error moving frames into {target:?}: {e}");
            if let Some(backup) = &backup {
                let _ = fs::rename(backup, target);
            }
            let _ = fs::remove_dir_all(&staging);
            return Err(NestError::WriteError { source: e });
        }
        if let Some(backup) = backup {
            if let Err(e) = fs::remove_dir_all(&backup) {
                error!("Error removing previous frames {backup:?}: {e}");
            }
        }
        Ok(())
    }
}
