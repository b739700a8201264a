pub mod client;
pub mod digest;
pub mod types;

pub use client::DeviceClient;
pub use types::{DeviceEvent, DeviceUser};

use thiserror::Error;

/// Failures talking to the access-control device.
///
/// `Unreachable` and `Malformed` are kept distinct so a reconciliation pass
/// can report "device down" separately from "protocol drift".
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("device returned HTTP {0}")]
    Status(u16),

    #[error("malformed device response: {0}")]
    Malformed(String),

    #[error("device rejected digest credentials")]
    Auth,
}
