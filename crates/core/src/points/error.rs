//! Points engine error types.

use thiserror::Error;

/// Errors that can occur during points calculation.
#[derive(Debug, Error)]
pub enum PointsError {
    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Amount too large to convert to points.
    #[error("Amount out of range for points calculation")]
    AmountOutOfRange,

    /// Configuration value is invalid.
    #[error("Invalid points configuration: {0}")]
    InvalidConfig(String),
}
