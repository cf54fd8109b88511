//! Error types for birdrisk.
//!
//! This module defines all error types used throughout the birdrisk crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for birdrisk operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Argument Errors ===
    /// A caller-supplied argument was rejected before any computation ran.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // === Dataset Errors ===
    /// Failed to open the observation dataset.
    #[error("failed to open dataset at {path}: {source}")]
    DatasetOpen {
        /// Path to the dataset file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The dataset header lacks one or more required columns.
    #[error("dataset is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        /// Names of the columns that were not found.
        missing: Vec<String>,
    },

    /// The dataset could not be parsed as delimited text.
    #[error("dataset parse error: {0}")]
    Csv(#[from] csv::Error),

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

    // === Lookup Errors ===
    /// A reference service request failed.
    #[error("{service} lookup failed: {message}")]
    Lookup {
        /// Name of the reference service.
        service: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// HTTP transport error from a reference service client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for birdrisk operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a new lookup error for the named service.
    #[must_use]
    pub fn lookup(service: &'static str, message: impl Into<String>) -> Self {
        Self::Lookup {
            service,
            message: message.into(),
        }
    }

    /// Check if this error is a caller-side validation failure.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this error reports missing dataset columns.
    #[must_use]
    pub fn is_missing_columns(&self) -> bool {
        matches!(self, Self::MissingColumns { .. })
    }
}
