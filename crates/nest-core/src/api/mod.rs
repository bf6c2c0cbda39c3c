//! Builder style entry points for complete embed and extract operations.

pub mod embed;
pub mod extract;
mod shared;

pub use shared::*;
