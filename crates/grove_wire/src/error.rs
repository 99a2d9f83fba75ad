//! Error types for the wire model.

use thiserror::Error;

/// Result type for wire-model operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while handling wire-level values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A key reference could not be converted into a `Key`.
    #[error("invalid key reference: {reason}")]
    InvalidReference {
        /// Description of what made the reference invalid.
        reason: String,
    },
}

impl WireError {
    /// Create an invalid reference error.
    pub fn invalid_reference(reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reason: reason.into(),
        }
    }
}
