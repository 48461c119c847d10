//! Unified error type for the blink1-status-lib crate.
//!
//! [`Blink1Error`] wraps module-specific errors (`DeviceError`, `OffloadError`)
//! and domain-specific error kinds (`Config`, `Color`).
//! `From` impls allow `?` to propagate across module boundaries.

use std::fmt;

use crate::device::DeviceError;
use crate::offload::OffloadError;

/// Unified error type for blink1-status-lib operations.
#[derive(Debug)]
pub enum Blink1Error {
    /// Device communication error (open, feature report I/O).
    Device(DeviceError),
    /// The blocking device call could not be run on the offload worker.
    Offload(OffloadError),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
}

impl fmt::Display for Blink1Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blink1Error::Device(e) => write!(f, "{e}"),
            Blink1Error::Offload(e) => write!(f, "{e}"),
            Blink1Error::Io(e) => write!(f, "I/O error: {e}"),
            Blink1Error::Config(e) => write!(f, "Config error: {e}"),
            Blink1Error::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for Blink1Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Blink1Error::Device(e) => Some(e),
            Blink1Error::Offload(e) => Some(e),
            Blink1Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for Blink1Error {
    fn from(e: DeviceError) -> Self {
        Blink1Error::Device(e)
    }
}

impl From<OffloadError> for Blink1Error {
    fn from(e: OffloadError) -> Self {
        Blink1Error::Offload(e)
    }
}

impl From<std::io::Error> for Blink1Error {
    fn from(e: std::io::Error) -> Self {
        Blink1Error::Io(e)
    }
}

/// Crate-level Result alias using [`Blink1Error`].
pub type Result<T> = std::result::Result<T, Blink1Error>;
