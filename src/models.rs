//! Core data models for the indexing and retrieval engine.
//!
//! These types represent the manifest entries, chunks, and reports that
//! flow through the indexing and search pipeline.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

/// Manifest entry for an indexed file.
///
/// Created on first successful index of a file, updated in place on
/// reindex, deleted when the file disappears from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the indexing root. Unique key.
    pub path: String,
    /// SHA-256 of the file bytes, lowercase hex.
    pub content_hash: String,
    /// File size in bytes.
    pub size: i64,
    /// Modification time, unix seconds.
    pub mtime: i64,
    /// When the file was last successfully indexed, unix seconds.
    pub last_indexed: i64,
}

/// A chunk of extracted document text, with its embedding.
///
/// Exclusively owned by the [`FileRecord`] named in `source_file`; the
/// full chunk set for a file is always replaced wholesale.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    /// Generated UUID.
    pub id: String,
    /// Owning file path (manifest key).
    pub source_file: String,
    /// 0-based, contiguous per file.
    pub chunk_index: i64,
    pub content: String,
    /// Fixed-length embedding; dimension is constant per store instance.
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, String>,
    /// Unix seconds.
    pub indexed_at: i64,
}

/// Classification of a file relative to the stored manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    New,
    Changed,
    Unchanged,
}

/// A ranked search hit. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub source_file: String,
    pub chunk_index: i64,
    pub content: String,
    pub score: f32,
}

/// A file the indexing run could not process.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub reason: String,
}

/// Outcome of a single indexing run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    /// Files successfully (re)indexed.
    pub processed: u64,
    /// Files skipped because they were unchanged.
    pub skipped_unchanged: u64,
    /// Files classified as new or changed at scan time.
    pub new_or_changed: u64,
    /// Files that failed extraction, embedding, or timed out.
    pub failed: Vec<FailedFile>,
    /// Total chunks written by this run.
    pub chunks_created: u64,
    /// Manifest entries removed because the file no longer exists.
    pub deleted: u64,
    /// Whether the run stopped early at a cancellation check.
    pub cancelled: bool,
    #[serde(skip)]
    pub duration: Duration,
}

/// Snapshot served to the protocol/CLI layer: persisted store counts
/// combined with failures from the most recent run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStatus {
    /// Files known to the engine (indexed plus last-run failures).
    pub total_files: i64,
    /// Files with a committed manifest entry.
    pub indexed_files: i64,
    pub failed_files: Vec<FailedFile>,
    pub total_chunks: i64,
    /// Per-extension breakdown: (extension, file count, chunk count).
    pub by_extension: Vec<(String, i64, i64)>,
}

/// Aggregate store counts, used by the status report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub total_files: i64,
    pub total_chunks: i64,
    /// Per-extension breakdown: (extension, file count, chunk count).
    pub by_extension: Vec<(String, i64, i64)>,
}
