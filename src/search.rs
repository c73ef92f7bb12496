//! Query-side search engine.
//!
//! Embeds the query text via the configured [`EmbeddingGateway`] and
//! ranks stored chunks by cosine similarity. If the embedding call fails
//! the whole search fails — there is deliberately no fallback to empty
//! or text-only results.

use std::sync::Arc;

use crate::embedding::EmbeddingGateway;
use crate::error::Result;
use crate::models::SearchResult;
use crate::store::VectorStore;

/// Semantic search over the vector store.
pub struct SearchEngine {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingGateway>,
}

impl SearchEngine {
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn EmbeddingGateway>) -> Self {
        Self { store, embedder }
    }

    /// Search for chunks semantically similar to `query`.
    ///
    /// Returns at most `top_k` results with similarity >= `min_similarity`,
    /// ordered by similarity descending with deterministic tie-breaks.
    /// `file_filters` restricts results to chunks whose source file equals
    /// a filter or ends with one.
    ///
    /// Fails with an embedding error if the provider is unavailable or
    /// times out; safe to call while an indexing run is in progress.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f32,
        file_filters: Option<&[String]>,
    ) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        self.store
            .similarity_search(&query_embedding, top_k, min_similarity, file_filters)
            .await
    }
}
