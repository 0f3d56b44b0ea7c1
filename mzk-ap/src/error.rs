//! Error types for mzk-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use crate::catalog::CatalogError;
use thiserror::Error;

/// Main error type for the playback engine
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog lookup failed (track, settings or tracklist)
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Song has no stream format carrying audio
    #[error("No playable format for {0}")]
    NoPlayableFormat(String),

    /// Pipeline refused to start playing
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// Queue management errors
    #[error("Queue error: {0}")]
    Queue(String),

    /// Blob store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Snapshot (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An async lookup did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl From<mzk_common::Error> for Error {
    fn from(err: mzk_common::Error) -> Self {
        match err {
            mzk_common::Error::Database(e) => Error::Database(e),
            mzk_common::Error::Io(e) => Error::Io(e),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Convenience Result type using mzk-ap Error
pub type Result<T> = std::result::Result<T, Error>;
