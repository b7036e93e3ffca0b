// SPDX-License-Identifier: MIT

//! Error types for the key gate
//!
//! Provides a unified error taxonomy using `thiserror` for ergonomic error handling.
//! Most failure modes in this system are deliberately silent (the controller degrades
//! to the locked view); these types cover the explicit operations that can still fail.

pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for key-gate operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage slot access failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Clipboard operation failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Key validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
