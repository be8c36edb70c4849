//! Error types for parkbill.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in parkbill.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or malformed settings, absent secrets).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input rejected before persistence; carries the offending field path.
    #[error("validation error: {field}: {message}")]
    Validation {
        /// Path of the rejected field (e.g. `schedule.effective_to`).
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// Entity lookup that found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Failure from the backing store.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Failure attaching a paid subscription to its parking area.
    #[error("activation error: {0}")]
    Activation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a validation error for a given field path.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
