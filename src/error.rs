//! Error types for the recognizer's loading paths.
//!
//! All failures in this subsystem are local and recoverable: a malformed
//! config document falls back to built-in defaults, a malformed store row is
//! skipped, a broken regex is dropped. These errors therefore surface only on
//! loader seams (config parsing, store access); `recognize` itself never
//! returns an error.

use std::io;

use thiserror::Error;

/// The error type for dictionary loading operations.
#[derive(Error, Debug)]
pub enum RecognizerError {
    /// I/O errors while reading the dictionary config document.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON decode errors (config document, encoded row fields).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config document errors beyond raw JSON syntax.
    #[error("Config error: {0}")]
    Config(String),

    /// Dictionary store access errors.
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type alias for loading operations.
pub type Result<T> = std::result::Result<T, RecognizerError>;

impl RecognizerError {
    /// Create a new config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RecognizerError::Config(msg.into())
    }

    /// Create a new store error.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        RecognizerError::Store(msg.into())
    }
}
