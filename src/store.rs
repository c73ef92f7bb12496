//! SQLite-backed vector store: manifest of files plus their chunks and
//! embeddings.
//!
//! All writes are transactional at file granularity. Readers observe
//! either the fully-old or fully-new chunk set for a file, never a mix;
//! a failed replace rolls back entirely and leaves the prior state
//! untouched. The store is durable: reopening yields the manifest and
//! chunks as last committed.

use std::collections::HashMap;

use sqlx::{Row, SqlitePool};

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::{EngineError, Result};
use crate::migrate;
use crate::models::{DocumentChunk, FileRecord, SearchResult, StoreStats};

/// Durable manifest + chunk store over SQLite.
///
/// The embedding dimension is pinned into the `meta` table when the store
/// is first opened; opening an existing store with a different dimension
/// fails loudly instead of silently truncating or padding vectors.
#[derive(Debug)]
pub struct VectorStore {
    pool: SqlitePool,
    dims: usize,
}

impl VectorStore {
    /// Open the store over `pool`, creating the schema if needed and
    /// validating the embedding dimension pin.
    ///
    /// `dims = Some(n)` pins the dimension on first open and verifies it
    /// on every later open; `None` adopts the pinned dimension of an
    /// existing store (read-only consumers like `status`).
    pub async fn open(pool: SqlitePool, dims: Option<usize>) -> Result<Self> {
        migrate::run_migrations(&pool).await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT value FROM meta WHERE key = 'embedding_dims'")
                .fetch_optional(&pool)
                .await?;
        let pinned = existing.and_then(|s| s.parse::<usize>().ok());

        let dims = match (pinned, dims) {
            (Some(p), Some(d)) if p != d => {
                return Err(EngineError::Configuration(format!(
                    "store was created with embedding dimension {} but {} was configured; \
                     rebuild the store or switch back to the original embedding model",
                    p, d
                )));
            }
            (Some(p), _) => p,
            (None, Some(d)) if d > 0 => {
                sqlx::query("INSERT INTO meta (key, value) VALUES ('embedding_dims', ?)")
                    .bind(d.to_string())
                    .execute(&pool)
                    .await?;
                d
            }
            _ => {
                return Err(EngineError::Configuration(
                    "no embedding dimension configured; set embedding.dims".to_string(),
                ));
            }
        };

        Ok(Self { pool, dims })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Replace a file's chunk set and upsert its manifest entry in one
    /// transaction. On any failure the transaction rolls back and the
    /// prior chunk set and record remain untouched.
    ///
    /// The chunk set must belong to `path`, carry contiguous indices
    /// starting at 0, and match the store's embedding dimension; a
    /// malformed set is rejected before any write.
    pub async fn replace_file_chunks(
        &self,
        path: &str,
        content_hash: &str,
        size: i64,
        mtime: i64,
        chunks: &[DocumentChunk],
    ) -> Result<()> {
        // Validate before touching the store: a malformed chunk set is a
        // caller problem, not a transaction failure.
        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.source_file != path {
                return Err(EngineError::Configuration(format!(
                    "chunk {} names source file {} but was submitted for {}",
                    chunk.chunk_index, chunk.source_file, path
                )));
            }
            if chunk.chunk_index != i as i64 {
                return Err(EngineError::Configuration(format!(
                    "chunk indices for {} must be contiguous from 0; found {} at position {}",
                    path, chunk.chunk_index, i
                )));
            }
            if chunk.embedding.len() != self.dims {
                return Err(EngineError::Configuration(format!(
                    "chunk {} of {} has embedding dimension {}, store expects {}",
                    chunk.chunk_index,
                    path,
                    chunk.embedding.len(),
                    self.dims
                )));
            }
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO files (path, content_hash, size, mtime, last_indexed)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET
                content_hash = excluded.content_hash,
                size = excluded.size,
                mtime = excluded.mtime,
                last_indexed = excluded.last_indexed
            "#,
        )
        .bind(path)
        .bind(content_hash)
        .bind(size)
        .bind(mtime)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM chunks WHERE source_file = ?")
            .bind(path)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            let blob = vec_to_blob(&chunk.embedding);
            let metadata_json =
                serde_json::to_string(&chunk.metadata).unwrap_or_else(|_| "{}".to_string());
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source_file, chunk_index, content, embedding, metadata_json, indexed_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.source_file)
            .bind(chunk.chunk_index)
            .bind(&chunk.content)
            .bind(&blob)
            .bind(&metadata_json)
            .bind(chunk.indexed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove a file's manifest entry and all its chunks atomically.
    pub async fn delete_file_chunks(&self, path: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks WHERE source_file = ?")
            .bind(path)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM files WHERE path = ?")
            .bind(path)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Point lookup of a single manifest entry.
    pub async fn get_manifest_entry(&self, path: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query(
            "SELECT path, content_hash, size, mtime, last_indexed FROM files WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| FileRecord {
            path: r.get("path"),
            content_hash: r.get("content_hash"),
            size: r.get("size"),
            mtime: r.get("mtime"),
            last_indexed: r.get("last_indexed"),
        }))
    }

    /// The full manifest, keyed by path.
    pub async fn manifest(&self) -> Result<HashMap<String, FileRecord>> {
        let rows = sqlx::query("SELECT path, content_hash, size, mtime, last_indexed FROM files")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let record = FileRecord {
                    path: r.get("path"),
                    content_hash: r.get("content_hash"),
                    size: r.get("size"),
                    mtime: r.get("mtime"),
                    last_indexed: r.get("last_indexed"),
                };
                (record.path.clone(), record)
            })
            .collect())
    }

    /// A file's chunks ordered by chunk index.
    pub async fn file_chunks(&self, path: &str) -> Result<Vec<DocumentChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT id, source_file, chunk_index, content, embedding, metadata_json, indexed_at
            FROM chunks WHERE source_file = ? ORDER BY chunk_index ASC
            "#,
        )
        .bind(path)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let blob: Vec<u8> = r.get("embedding");
                let metadata_json: String = r.get("metadata_json");
                DocumentChunk {
                    id: r.get("id"),
                    source_file: r.get("source_file"),
                    chunk_index: r.get("chunk_index"),
                    content: r.get("content"),
                    embedding: blob_to_vec(&blob),
                    metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
                    indexed_at: r.get("indexed_at"),
                }
            })
            .collect())
    }

    /// Exact linear-scan similarity search.
    ///
    /// Computes cosine similarity between `query` and every stored chunk
    /// embedding (optionally restricted to chunks whose `source_file`
    /// equals a filter or ends with one), discards scores below
    /// `min_similarity`, and returns at most `top_k` results ordered by
    /// score descending; ties broken by `(source_file, chunk_index)`
    /// ascending for determinism.
    pub async fn similarity_search(
        &self,
        query: &[f32],
        top_k: usize,
        min_similarity: f32,
        file_filters: Option<&[String]>,
    ) -> Result<Vec<SearchResult>> {
        if query.len() != self.dims {
            return Err(EngineError::Configuration(format!(
                "query embedding dimension {} does not match store dimension {}",
                query.len(),
                self.dims
            )));
        }

        let rows =
            sqlx::query("SELECT source_file, chunk_index, content, embedding FROM chunks")
                .fetch_all(&self.pool)
                .await?;

        let mut results: Vec<SearchResult> = Vec::new();

        for row in &rows {
            let source_file: String = row.get("source_file");

            if let Some(filters) = file_filters {
                let matched = filters
                    .iter()
                    .any(|f| source_file == *f || source_file.ends_with(f.as_str()));
                if !matched {
                    continue;
                }
            }

            let blob: Vec<u8> = row.get("embedding");
            let embedding = blob_to_vec(&blob);
            let score = cosine_similarity(query, &embedding);
            if score < min_similarity {
                continue;
            }

            results.push(SearchResult {
                source_file,
                chunk_index: row.get("chunk_index"),
                content: row.get("content"),
                score,
            });
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.source_file.cmp(&b.source_file))
                .then_with(|| a.chunk_index.cmp(&b.chunk_index))
        });
        results.truncate(top_k);

        Ok(results)
    }

    /// Aggregate counts for the status report.
    pub async fn stats(&self) -> Result<StoreStats> {
        let total_files: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;
        let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT f.path, COUNT(c.id) AS chunk_count
            FROM files f
            LEFT JOIN chunks c ON c.source_file = f.path
            GROUP BY f.path
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_ext: HashMap<String, (i64, i64)> = HashMap::new();
        for row in &rows {
            let path: String = row.get("path");
            let chunk_count: i64 = row.get("chunk_count");
            let ext = std::path::Path::new(&path)
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_else(|| "(none)".to_string());
            let entry = by_ext.entry(ext).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += chunk_count;
        }

        let mut by_extension: Vec<(String, i64, i64)> = by_ext
            .into_iter()
            .map(|(ext, (files, chunks))| (ext, files, chunks))
            .collect();
        by_extension.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(StoreStats {
            total_files,
            total_chunks,
            by_extension,
        })
    }
}
