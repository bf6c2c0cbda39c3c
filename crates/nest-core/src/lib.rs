//! # Nest Core API
//!
//! Hides an encrypted, authenticated container in images, WAV audio, video frames and text.
//!
//! The entry points are the builders in [`api`]
//! - [`api::embed`] seals a payload and hides it in a carrier
//! - [`api::extract`] finds the container again and opens it
//!
//! # Usage Examples
//!
//! ## Hide data inside an image
//!
//! ```rust,no_run
//! use tempfile::tempdir;
//!
//! let temp_dir = tempdir().expect("Failed to create temporary directory");
//!
//! nest_core::api::embed::prepare()
//!     .with_payload_file("Cargo.toml")    // will hide this file inside the image
//!     .with_password("correct horse")     // derives the encryption key and the stego key
//!     .with_carrier("cover.png")
//!     .with_output(temp_dir.path().join("image-with-a-file-inside.png"))
//!     .execute()
//!     .expect("Failed to hide file in image");
//! ```
//!
//! ## Unveil data from an image
//!
//! ```rust,no_run
//! let payload = nest_core::api::extract::prepare()
//!     .from_secret_file("image-with-a-file-inside.png")
//!     .with_password("correct horse")
//!     .reveal()
//!     .expect("Failed to unveil payload from image");
//! ```

#![warn(clippy::redundant_else)]

pub mod api;
pub mod audit;
pub mod capacity;
pub mod commands;
pub mod container;
pub mod envelope;
pub mod error;
pub mod events;
pub mod media;
pub mod positions;
pub mod result;
pub mod stego_key;
pub mod universal_decoder;
pub mod universal_encoder;

pub use crate::error::NestError;
pub use crate::media::{Carrier, CarrierOptions, Media, Persist};
pub use crate::result::Result;
pub use crate::stego_key::StegoKey;

pub use nest_crypto::{CryptoError, KdfParams};
