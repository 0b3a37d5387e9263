//! Error types for gradebook.
//!
//! This module defines all error types used throughout the gradebook crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for gradebook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Errors ===
    /// A caller-supplied value violates a record constraint.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the violated constraint.
        message: String,
    },

    /// No record with the given id exists.
    #[error("no student with id {id}")]
    NotFound {
        /// The id that was looked up.
        id: u32,
    },

    /// The store already holds the maximum number of records.
    #[error("cannot add more students (limit of {max} reached)")]
    CapacityExceeded {
        /// The configured record capacity.
        max: usize,
    },

    /// The operation needs at least one record.
    #[error("no records")]
    EmptyStore,

    // === Persistence Errors ===
    /// Failed to read the data file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path of the file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the data or report file.
    #[error("cannot write to {path}: {source}")]
    FileWrite {
        /// Path of the file being written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure (terminal input/output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for gradebook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Check if this error is a missing-record error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error was caused by the caller rather than the environment.
    ///
    /// User errors are reported and the caller may simply try again; the
    /// store is unchanged.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::NotFound { .. }
                | Self::CapacityExceeded { .. }
                | Self::EmptyStore
        )
    }
}
