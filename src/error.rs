//! Error types for the BME680 session.

use core::convert::Infallible;

/// Errors reported by [`SensorSession`](crate::SensorSession).
///
/// Every failure of the compensation driver collapses into [`Error::Driver`].
/// The driver's own status is logged before it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A configuration value was outside its valid range. Nothing was changed.
    #[error("configuration value out of range")]
    InvalidSetting,
    /// The compensation driver reported a non-OK status.
    #[error("sensor driver reported a failure")]
    Driver,
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Result type alias for session operations.
pub type Result<T> = core::result::Result<T, Error>;
