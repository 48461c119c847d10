//! blink1-status: the blink(1) USB notification light as a light entity.

pub mod color;
pub mod config;
pub mod device;
pub mod error;
pub mod light;
pub mod offload;
pub mod platform;
pub mod protocol;

pub use error::Blink1Error;
