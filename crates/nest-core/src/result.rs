use crate::error::NestError;

pub type Result<T> = std::result::Result<T, NestError>;
