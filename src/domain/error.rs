// ============================================================
// Layer 3: Dataset Errors
// ============================================================
// Typed failures for the data pipeline. Everything above the
// domain layer works with anyhow::Result, and these convert into
// it automatically through `?` because they implement Error.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    /// A split ratio, batch size or corpus size that makes the
    /// downstream batching ill-defined.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A corpus entry that cannot be turned into a training pair.
    #[error("malformed example #{index}: {reason}")]
    MalformedExample { index: usize, reason: String },
}

impl DatasetError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedExample { index, reason: reason.into() }
    }
}
