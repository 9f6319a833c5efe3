use thiserror::Error;

/// Errors reported while discovering devices.
///
/// The display text of each variant doubles as the notice shown to the user.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Bluetooth LE is not supported on this device")]
    LeNotSupported,

    #[error("Bluetooth is not supported")]
    AdapterNotFound,

    #[error("Bluetooth was not enabled")]
    EnableDeclined,

    #[error("Bluetooth operation failed: {0}")]
    Btle(#[from] btleplug::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
