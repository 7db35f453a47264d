//! Error types for maus-dl
//!
//! This module provides the error taxonomy for the pipeline:
//! - Per-source extraction errors (isolated, a broken source yields zero entries)
//! - Normalization errors (item-level, the item is retried on the next run)
//! - Encoder errors (item-level, same isolation)
//! - Store I/O errors (fatal to the current run, never to the process)

use std::path::PathBuf;
use thiserror::Error;

use crate::types::SourceKind;

/// Result type alias for maus-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for maus-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "notify.bot_token")
        key: Option<String>,
    },

    /// Page or descriptor extraction failed
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Descriptor could not be normalized into media information
    #[error("normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// External encoder invocation failed
    #[error("encoder error: {0}")]
    Encode(#[from] EncodeError),

    /// Dedup store or run-state file I/O failed
    #[error("store I/O error at {path}: {source}")]
    Store {
        /// The persisted file the operation was working on
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Notification sink rejected or failed a call
    #[error("notification error: {0}")]
    Notify(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing or resolution error
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Per-source extraction errors
///
/// All of these are caught at the extractor boundary: the offending source is
/// reported to the error sink and contributes zero entries, other sources are
/// unaffected.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page yielded a different number of images and descriptors.
    ///
    /// Pairing images with descriptors by position is only sound when the counts
    /// match; anything else means the site layout changed and must not be guessed
    /// around.
    #[error("{context}: found {images} image urls but {descriptors} descriptor urls")]
    CountMismatch {
        /// The source the mismatch occurred in
        context: SourceKind,
        /// Number of image URLs found on the page
        images: usize,
        /// Number of descriptor URLs found on the page
        descriptors: usize,
    },

    /// The descriptor payload did not start with the known callback prefix
    #[error("descriptor envelope missing the expected callback prefix")]
    EnvelopePrefix,

    /// The descriptor payload was too short to hold the callback wrapper
    #[error("descriptor envelope too short to unwrap")]
    EnvelopeTruncated,
}

/// Normalization errors
///
/// Raised by [`crate::normalize::normalize`] when a raw descriptor cannot be
/// turned into a complete [`crate::types::MediaInformation`] value.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A required descriptor field is missing
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The airtime string did not have the expected `DD.MM.YYYY HH:MM` shape
    #[error("unparseable airtime: {0:?}")]
    Airtime(String),

    /// A descriptor URL field could not be parsed
    #[error("invalid descriptor url: {0:?}")]
    InvalidUrl(String),
}

/// External encoder errors
#[derive(Debug, Error)]
pub enum EncodeError {
    /// No encoder binary was configured and none was found in PATH
    #[error("ffmpeg not found in PATH and no explicit path configured")]
    BinaryNotFound,

    /// The encoder process could not be launched
    #[error("failed to launch encoder: {0}")]
    Spawn(String),

    /// The encoder exited unsuccessfully or wrote to stderr
    #[error("encoder failed ({status}): {stderr}")]
    Failed {
        /// Exit status description (code or signal)
        status: String,
        /// Captured stderr output
        stderr: String,
    },
}
