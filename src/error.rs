//! Engine error taxonomy.
//!
//! Per-file errors ([`ExtractError`], [`EmbedError`], plain I/O) are
//! recovered locally by the indexing coordinator and aggregated into the
//! run report. [`EngineError::Store`] and [`EngineError::Configuration`]
//! are fatal and propagate to the caller.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the indexing and retrieval engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    /// A store write or read failed. If this surfaces during an indexing
    /// run the run is aborted: no further writes are trustworthy.
    #[error("store transaction failed: {0}")]
    Store(#[from] sqlx::Error),

    /// Invalid configuration or a store/model mismatch (e.g. embedding
    /// dimension differs from the one the store was created with).
    /// Never silently coerced.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A second indexing run was triggered while one is active.
    #[error("an indexing run is already in progress")]
    IndexerBusy,
}

/// Errors produced by a [`TextExtractionGateway`](crate::extract::TextExtractionGateway).
///
/// The pipeline never panics on bad input; it returns one of these and
/// the coordinator skips the file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported content: {0}")]
    Unsupported(String),

    #[error("corrupt content: {0}")]
    Corrupt(String),

    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by an [`EmbeddingGateway`](crate::embedding::EmbeddingGateway).
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("embedding call timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
