use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub indexing: IndexingConfig,
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    /// Root directory to index.
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Upper bound on extraction+embedding time for a single file.
    #[serde(default = "default_file_timeout_secs")]
    pub file_timeout_secs: u64,
    /// Maximum file size handed to the text extractor, in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}
fn default_file_timeout_secs() -> u64 {
    120
}
fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size_words")]
    pub chunk_size_words: usize,
    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,
}

fn default_chunk_size_words() -> usize {
    300
}
fn default_overlap_words() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Embedding dimension. Pinned into the store on first open.
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_min_similarity() -> f32 {
    0.1
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.chunk_size_words == 0 {
        anyhow::bail!("chunking.chunk_size_words must be > 0");
    }
    if config.chunking.overlap_words >= config.chunking.chunk_size_words {
        anyhow::bail!(
            "chunking.overlap_words ({}) must be smaller than chunking.chunk_size_words ({})",
            config.chunking.overlap_words,
            config.chunking.chunk_size_words
        );
    }

    // Validate search defaults
    if config.search.top_k == 0 {
        anyhow::bail!("search.top_k must be >= 1");
    }
    if !(-1.0..=1.0).contains(&config.search.min_similarity) {
        anyhow::bail!("search.min_similarity must be in [-1.0, 1.0]");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("docdex.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        (tmp, path)
    }

    #[test]
    fn minimal_config_loads_with_defaults() {
        let (_tmp, path) = write_config(
            r#"
[db]
path = "/tmp/docdex.sqlite"

[indexing]
root = "/tmp/docs"

[chunking]
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.chunking.chunk_size_words, 300);
        assert_eq!(cfg.chunking.overlap_words, 50);
        assert_eq!(cfg.embedding.provider, "disabled");
        assert_eq!(cfg.search.top_k, 5);
        assert!((cfg.search.min_similarity - 0.1).abs() < 1e-6);
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let (_tmp, path) = write_config(
            r#"
[db]
path = "/tmp/docdex.sqlite"

[indexing]
root = "/tmp/docs"

[chunking]
chunk_size_words = 10
overlap_words = 10
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("overlap_words"));
    }

    #[test]
    fn enabled_embedding_requires_model_and_dims() {
        let (_tmp, path) = write_config(
            r#"
[db]
path = "/tmp/docdex.sqlite"

[indexing]
root = "/tmp/docs"

[chunking]

[embedding]
provider = "openai"
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("embedding.dims"));
    }

    #[test]
    fn unknown_provider_rejected() {
        let (_tmp, path) = write_config(
            r#"
[db]
path = "/tmp/docdex.sqlite"

[indexing]
root = "/tmp/docs"

[chunking]

[embedding]
provider = "quantum"
model = "m"
dims = 8
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }
}
