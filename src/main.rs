//! # docdex CLI
//!
//! The `docdex` binary is the command-line interface for the document
//! indexing and retrieval engine. It provides commands for store
//! initialization, indexing runs, semantic search, and status reporting.
//!
//! ## Usage
//!
//! ```bash
//! docdex --config ./config/docdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docdex init` | Create the SQLite store and run schema migrations |
//! | `docdex index` | Run an incremental indexing pass over the configured root |
//! | `docdex index --force` | Reindex every file, bypassing change detection |
//! | `docdex search "<query>"` | Semantic search over indexed chunks |
//! | `docdex status` | Show what is indexed and any recent failures |

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docdex::config::{self, Config};
use docdex::db;
use docdex::embedding::create_gateway;
use docdex::extract::PlainTextExtractor;
use docdex::indexer::IndexingCoordinator;
use docdex::search::SearchEngine;
use docdex::status;
use docdex::store::VectorStore;

/// docdex — a local-first document indexing and semantic retrieval engine.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docdex.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docdex",
    about = "docdex — a local-first document indexing and semantic retrieval engine",
    version,
    long_about = "docdex walks a directory of documents, extracts and chunks their text, \
    embeds the chunks through a configurable provider, and stores everything in SQLite \
    for incremental reindexing and cosine-similarity search."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docdex.toml`. The indexing root, database
    /// path, chunking, and embedding settings are read from this file.
    #[arg(long, global = true, default_value = "./config/docdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the store.
    ///
    /// Creates the SQLite database file, runs schema migrations, and pins
    /// the configured embedding dimension. Idempotent — running it again
    /// is safe as long as the dimension has not changed.
    Init,

    /// Run an indexing pass over the configured root.
    ///
    /// Enumerates matching files, skips ones whose content is unchanged
    /// since the last pass, and extracts, chunks, embeds, and stores the
    /// rest. One file's failure never aborts the run.
    Index {
        /// Reindex every file, bypassing change detection.
        #[arg(long)]
        force: bool,
    },

    /// Search indexed chunks by semantic similarity.
    ///
    /// Embeds the query and ranks stored chunks by cosine similarity,
    /// printing the top matches with scores and source locations.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum similarity score in [-1.0, 1.0].
        #[arg(long)]
        min_similarity: Option<f32>,

        /// Restrict results to source files matching this path or suffix.
        /// May be given multiple times.
        #[arg(long = "file")]
        files: Vec<String>,
    },

    /// Show index status.
    ///
    /// Prints file and chunk counts, a per-extension breakdown, and any
    /// failures recorded by the most recent indexing run.
    Status,
}

/// Open the store, pinning the configured dimension when one is set.
async fn open_store(cfg: &Config) -> anyhow::Result<VectorStore> {
    let pool = db::connect(&cfg.db.path).await?;
    let store = VectorStore::open(pool, cfg.embedding.dims).await?;
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docdex=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = open_store(&cfg).await?;
            println!(
                "Store initialized at {} (embedding dimension {}).",
                cfg.db.path.display(),
                store.dims()
            );
        }
        Commands::Index { force } => {
            if !cfg.embedding.is_enabled() {
                anyhow::bail!(
                    "indexing requires an embedding provider; set [embedding] provider in {}",
                    cli.config.display()
                );
            }

            let store = Arc::new(open_store(&cfg).await?);
            let extractor = Arc::new(PlainTextExtractor::new(cfg.indexing.max_file_bytes));
            let embedder: Arc<dyn docdex::embedding::EmbeddingGateway> =
                Arc::from(create_gateway(&cfg.embedding)?);

            let coordinator = IndexingCoordinator::new(
                Arc::clone(&store),
                extractor,
                embedder,
                cfg.indexing.clone(),
                cfg.chunking.clone(),
                cfg.embedding.batch_size,
            );

            let report = coordinator.run_indexing(&cfg.indexing.root, force).await?;

            println!(
                "Indexed {} file(s) ({} chunk(s)), skipped {} unchanged, removed {} deleted.",
                report.processed,
                report.chunks_created,
                report.skipped_unchanged,
                report.deleted
            );
            if report.cancelled {
                println!("Run was cancelled before completion.");
            }
            if !report.failed.is_empty() {
                println!("{} file(s) failed:", report.failed.len());
                for failure in &report.failed {
                    println!("  {} — {}", failure.path, failure.reason);
                }
            }
            println!("Done in {:.1}s.", report.duration.as_secs_f64());
        }
        Commands::Search {
            query,
            top_k,
            min_similarity,
            files,
        } => {
            if !cfg.embedding.is_enabled() {
                anyhow::bail!(
                    "search requires an embedding provider; set [embedding] provider in {}",
                    cli.config.display()
                );
            }

            let store = Arc::new(open_store(&cfg).await?);
            let embedder: Arc<dyn docdex::embedding::EmbeddingGateway> =
                Arc::from(create_gateway(&cfg.embedding)?);
            let engine = SearchEngine::new(store, embedder);

            let top_k = top_k.unwrap_or(cfg.search.top_k);
            let min_similarity = min_similarity.unwrap_or(cfg.search.min_similarity);
            let filters = if files.is_empty() { None } else { Some(files.as_slice()) };

            let results = engine.search(&query, top_k, min_similarity, filters).await?;

            if results.is_empty() {
                println!("No results.");
            } else {
                for (i, result) in results.iter().enumerate() {
                    println!(
                        "{}. [{:.3}] {}#{}",
                        i + 1,
                        result.score,
                        result.source_file,
                        result.chunk_index
                    );
                    let snippet: String = result.content.chars().take(200).collect();
                    println!("   {}", snippet.replace('\n', " "));
                    println!();
                }
            }
        }
        Commands::Status => {
            let store = Arc::new(open_store(&cfg).await?);
            let stats = store.stats().await?;
            let report = docdex::models::IndexStatus {
                total_files: stats.total_files,
                indexed_files: stats.total_files,
                failed_files: Vec::new(),
                total_chunks: stats.total_chunks,
                by_extension: stats.by_extension,
            };
            status::print_status(&cfg.db.path, &report);
        }
    }

    Ok(())
}
