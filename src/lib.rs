//! # docdex
//!
//! A local-first document indexing and semantic retrieval engine.
//!
//! docdex ingests a directory of documents, extracts and chunks their
//! text, computes vector embeddings through a pluggable gateway, and
//! persists everything in SQLite for later similarity search. Incremental
//! passes skip unchanged files, and every file's chunk set is replaced in
//! a single transaction so a failed pass never leaves orphan chunks or
//! stale manifest entries behind.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────────────┐   ┌──────────┐
//! │  walker   │──▶│  IndexingCoordinator      │──▶│  SQLite  │
//! │  + change │   │  extract → chunk → embed  │   │  store   │
//! └──────────┘   └───────────────────────────┘   └────┬─────┘
//!                                                     │
//!                                        ┌────────────┤
//!                                        ▼            ▼
//!                                  ┌──────────┐ ┌──────────┐
//!                                  │  search   │ │  status  │
//!                                  └──────────┘ └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docdex init                   # create the store
//! docdex index                  # incremental indexing pass
//! docdex index --force          # reindex everything
//! docdex search "deployment"    # semantic search
//! docdex status                 # what's indexed
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Engine error taxonomy |
//! | [`walker`] | File enumeration under the root |
//! | [`change`] | Change detection against the manifest |
//! | [`chunk`] | Word-boundary text chunking |
//! | [`extract`] | Text extraction gateway |
//! | [`embedding`] | Embedding gateway and vector utilities |
//! | [`store`] | Durable vector store over SQLite |
//! | [`indexer`] | Indexing run orchestration |
//! | [`search`] | Semantic search engine |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod change;
pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod migrate;
pub mod models;
pub mod search;
pub mod status;
pub mod store;
pub mod walker;
