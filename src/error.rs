//! Error types for Hoard.

use thiserror::Error;

/// Common error type for Hoard.
#[derive(Error, Debug)]
pub enum HoardError {
    /// Referenced node does not resolve.
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate name where renaming is not the policy, or a physical key collision.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Empty or missing required field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Uploaded payload exceeds the configured maximum.
    #[error("payload too large: {size} bytes (max {max} bytes)")]
    TooLarge {
        /// Size of the rejected payload.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// Structurally invalid operation, e.g. deleting a non-empty folder.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Operation is never allowed, e.g. deleting the root folder.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Physical write or delete failure not otherwise classified.
    #[error("storage failure: {0}")]
    Storage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for Hoard operations.
pub type Result<T> = std::result::Result<T, HoardError>;
