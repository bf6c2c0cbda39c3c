pub mod audit;
pub mod capacity;
pub mod hide;
pub mod keygen;
pub mod unveil;

use std::fs;
use std::path::Path;

use nest_core::NestError;

use crate::CliResult;

fn read_pem(file: &Path) -> CliResult<String> {
    fs::read_to_string(file).map_err(|source| NestError::ReadError { source })
}
