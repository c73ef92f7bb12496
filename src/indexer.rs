//! Indexing run orchestration.
//!
//! Coordinates a full or incremental pass: enumerate → change detection →
//! extract → chunk → embed → store, one file at a time. One file's
//! failure never aborts the run or touches other files' data; only store
//! and configuration errors are fatal, because after either no further
//! writes are trustworthy.
//!
//! At most one run is active at a time. A second trigger is rejected
//! with [`EngineError::IndexerBusy`] rather than queued. Cancellation is
//! cooperative and checked between files; in-flight per-file work is
//! never interrupted mid-transaction.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::change;
use crate::chunk;
use crate::config::{ChunkingConfig, IndexingConfig};
use crate::embedding::EmbeddingGateway;
use crate::error::{EngineError, Result};
use crate::extract::TextExtractionGateway;
use crate::models::{ChangeState, DocumentChunk, FailedFile, IndexReport, IndexStatus};
use crate::store::VectorStore;
use crate::walker::{self, DiscoveredFile};

/// Handle for requesting cooperative cancellation of an active run.
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Orchestrates indexing runs over a [`VectorStore`] and the external
/// extraction/embedding gateways.
pub struct IndexingCoordinator {
    store: Arc<VectorStore>,
    extractor: Arc<dyn TextExtractionGateway>,
    embedder: Arc<dyn EmbeddingGateway>,
    indexing: IndexingConfig,
    chunking: ChunkingConfig,
    batch_size: usize,
    running: AtomicBool,
    cancel: Arc<AtomicBool>,
    last_report: Mutex<Option<IndexReport>>,
}

impl IndexingCoordinator {
    pub fn new(
        store: Arc<VectorStore>,
        extractor: Arc<dyn TextExtractionGateway>,
        embedder: Arc<dyn EmbeddingGateway>,
        indexing: IndexingConfig,
        chunking: ChunkingConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            extractor,
            embedder,
            indexing,
            chunking,
            batch_size,
            running: AtomicBool::new(false),
            cancel: Arc::new(AtomicBool::new(false)),
            last_report: Mutex::new(None),
        }
    }

    /// Handle that cancels the active (or next) run at a file boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel))
    }

    /// The report of the most recently completed run, if any.
    pub fn last_report(&self) -> Option<IndexReport> {
        self.last_report.lock().expect("report lock poisoned").clone()
    }

    /// Status snapshot for the protocol/CLI layer.
    pub async fn status(&self) -> Result<IndexStatus> {
        let stats = self.store.stats().await?;
        let manifest = self.store.manifest().await?;
        let failed_files = self
            .last_report()
            .map(|r| r.failed)
            .unwrap_or_default();

        // A file that failed in the last run but was indexed before still
        // has a manifest entry; only never-indexed failures add to the
        // total.
        let unindexed_failures = failed_files
            .iter()
            .filter(|f| !manifest.contains_key(&f.path))
            .count() as i64;

        Ok(IndexStatus {
            total_files: stats.total_files + unindexed_failures,
            indexed_files: stats.total_files,
            failed_files,
            total_chunks: stats.total_chunks,
            by_extension: stats.by_extension,
        })
    }

    /// Run a full (`force = true`) or incremental indexing pass over
    /// `root`.
    ///
    /// Rejected with [`EngineError::IndexerBusy`] if a run is already
    /// active. Searches may execute concurrently with the run.
    pub async fn run_indexing(&self, root: &Path, force: bool) -> Result<IndexReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::IndexerBusy);
        }
        let _guard = RunGuard(&self.running);
        self.cancel.store(false, Ordering::SeqCst);

        let start = Instant::now();
        let mut report = IndexReport::default();

        let files = walker::enumerate_files(&self.indexing, root)?;
        let manifest = self.store.manifest().await?;

        let states: HashMap<String, ChangeState> = if force {
            // Force bypasses change detection entirely.
            HashMap::new()
        } else {
            change::batch_check(&files, &manifest)
        };

        let file_timeout = Duration::from_secs(self.indexing.file_timeout_secs);
        let mut seen: HashSet<String> = HashSet::with_capacity(files.len());

        for file in &files {
            seen.insert(file.relative_path.clone());

            if self.cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }

            if !force {
                if let Some(ChangeState::Unchanged) = states.get(&file.relative_path) {
                    report.skipped_unchanged += 1;
                    continue;
                }
            }
            report.new_or_changed += 1;

            // External work (extraction, embedding) is bounded so one
            // unresponsive call cannot stall the whole run.
            let processed = match tokio::time::timeout(file_timeout, self.process_file(file)).await
            {
                Err(_) => {
                    self.record_failure(
                        &mut report,
                        file,
                        format!("timed out after {:?}", file_timeout),
                    );
                    continue;
                }
                Ok(Err(e)) => match e {
                    EngineError::Store(_) | EngineError::Configuration(_) => return Err(e),
                    recoverable => {
                        self.record_failure(&mut report, file, recoverable.to_string());
                        continue;
                    }
                },
                Ok(Ok(p)) => p,
            };

            self.store
                .replace_file_chunks(
                    &file.relative_path,
                    &processed.content_hash,
                    file.size,
                    file.mtime,
                    &processed.chunks,
                )
                .await?;

            report.processed += 1;
            report.chunks_created += processed.chunks.len() as u64;
        }

        // Sweep manifest entries whose file disappeared from the root.
        if !report.cancelled {
            for path in manifest.keys() {
                if !seen.contains(path) {
                    self.store.delete_file_chunks(path).await?;
                    report.deleted += 1;
                }
            }
        }

        report.duration = start.elapsed();
        *self.last_report.lock().expect("report lock poisoned") = Some(report.clone());
        Ok(report)
    }

    /// Extract, chunk, and embed a single file. Does not touch the store.
    async fn process_file(&self, file: &DiscoveredFile) -> Result<ProcessedFile> {
        // Hash before extraction. The stored hash must describe bytes no
        // newer than the extracted text: if the file is edited mid-run,
        // the manifest ends up stale against the disk and the next pass
        // reindexes it, instead of the stale chunks passing as current.
        let content_hash = change::compute_hash(&file.absolute_path)?;

        let text = self.extractor.extract(&file.absolute_path).await?;

        let pieces = chunk::split(
            &text,
            self.chunking.chunk_size_words,
            self.chunking.overlap_words,
        )?;

        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(pieces.len());
        for batch in pieces.chunks(self.batch_size.max(1)) {
            let texts: Vec<String> = batch.to_vec();
            let results = self.embedder.embed_batch(&texts).await?;
            for item in results {
                // Any per-item failure fails the whole file: its chunk
                // set is replaced wholesale or not at all.
                embeddings.push(item?);
            }
        }

        let now = chrono::Utc::now().timestamp();
        let extension = Path::new(&file.relative_path)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        let chunks: Vec<DocumentChunk> = pieces
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| {
                let mut metadata = HashMap::new();
                if !extension.is_empty() {
                    metadata.insert("extension".to_string(), extension.clone());
                }
                DocumentChunk {
                    id: Uuid::new_v4().to_string(),
                    source_file: file.relative_path.clone(),
                    chunk_index: i as i64,
                    content,
                    embedding,
                    metadata,
                    indexed_at: now,
                }
            })
            .collect();

        Ok(ProcessedFile {
            content_hash,
            chunks,
        })
    }

    fn record_failure(&self, report: &mut IndexReport, file: &DiscoveredFile, reason: String) {
        tracing::warn!("failed to index {}: {}", file.relative_path, reason);
        report.failed.push(FailedFile {
            path: file.relative_path.clone(),
            reason,
        });
    }
}

struct ProcessedFile {
    content_hash: String,
    chunks: Vec<DocumentChunk>,
}

/// Clears the run gate when the run finishes or errors out.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
