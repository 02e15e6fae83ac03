//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, disk-distribution saturation, buffer alignment
//! violations, and compute-device failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("disk distribution saturated after {placed} points")]
    Saturated { placed: usize },

    #[error("buffer range offset {offset} is not a multiple of the device alignment {required}")]
    Alignment { offset: u64, required: u64 },

    #[error("compute device unavailable: {0}")]
    Device(String),

    #[error("compute device lost: {0}")]
    DeviceLost(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
