//! Error types for the Outlay service.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the Outlay service.
#[derive(Error, Debug)]
pub enum Error {
    /// A request field failed validation.
    #[error("{message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// No record matched the given identifier.
    #[error("No expense found with id: {id}")]
    NotFound {
        /// The identifier that matched nothing.
        id: String,
    },

    /// The underlying document store failed.
    #[error("Store error: {message}")]
    Store {
        /// Error message from the store driver.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Returns `true` if this error is the caller's fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }

    /// Creates a validation error for the given field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error for the given identifier.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a store error with the given message.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Creates an internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
