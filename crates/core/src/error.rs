//! Error types for spillvec
//!
//! This module defines all error types used throughout the workspace.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every error is surfaced synchronously to the caller of the operation that
//! triggered it. Nothing is retried.

use std::io;
use thiserror::Error;

/// Result type alias for spillvec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for spillvec
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, or a codec backend that is not compiled in
    ///
    /// Only ever returned from constructors.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error while opening, appending to, or reading the spill stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serializing or compressing a value failed during push
    #[error("Encoding error (codec={codec_id}): {detail}")]
    Encoding {
        /// Codec that attempted the encode
        codec_id: String,
        /// Human-readable error description
        detail: String,
    },

    /// Unframing, decompressing or deserializing a record failed during read
    ///
    /// Signals corruption or a codec mismatch. Carries the codec identity and
    /// input length so callers can tell the two apart.
    #[error("Decoding error (codec={codec_id}, data_len={data_len}): {detail}")]
    Decoding {
        /// Codec that attempted the decode
        codec_id: String,
        /// Human-readable error description
        detail: String,
        /// Length of the data that failed to decode
        data_len: usize,
    },

    /// Cursor accessed without a prior successful positioning step
    #[error("Invalid cursor state: {0}")]
    State(String),
}

impl Error {
    /// Create an encoding error for the given codec.
    pub fn encoding(codec_id: impl Into<String>, detail: impl ToString) -> Self {
        Error::Encoding {
            codec_id: codec_id.into(),
            detail: detail.to_string(),
        }
    }

    /// Create a decoding error with full diagnostic context.
    pub fn decoding(codec_id: impl Into<String>, detail: impl ToString, data_len: usize) -> Self {
        Error::Decoding {
            codec_id: codec_id.into(),
            detail: detail.to_string(),
            data_len,
        }
    }

    /// Create a configuration error.
    pub fn configuration(detail: impl Into<String>) -> Self {
        Error::Configuration(detail.into())
    }

    /// Returns true if this error means stored data could not be read back.
    pub fn is_decoding(&self) -> bool {
        matches!(self, Error::Decoding { .. })
    }
}
