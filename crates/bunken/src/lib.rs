//! # Bunken
//!
//! Embedded semantic search over journal article metadata.
//!
//! Articles live in a SQLite store ([`ArticleStore`]); their titles are
//! embedded ([`bunken_core`]) and indexed in an in-process vector store
//! ([`bunken_vecdb`]). A [`SyncPipeline`] rebuilds the title collection from
//! the relational store, and a [`QueryEngine`] answers free-text queries in
//! two stages: nearest titles first, then the article rows, returned in
//! similarity order.
//!
//! The vector collection is derived state. It lives for the process and is
//! rebuilt from SQLite on demand, so the database file is the only thing a
//! deployment needs to persist.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::NaiveDate;
//! use bunken::{ArticleStore, HashEmbedder, NewArticle, QueryEngine, SyncPipeline, VectorStore};
//!
//! let mut store = ArticleStore::open_in_memory().unwrap();
//! let date = NaiveDate::from_ymd_opt(2026, 8, 14).unwrap();
//! store
//!     .insert_article(&NewArticle::new(
//!         "EP2-signaling blockade for immune escape in glioblastoma",
//!         "R. Tanaka, M. Silva",
//!         date,
//!         "We identify a prostaglandin receptor as a therapy target.",
//!     ))
//!     .unwrap();
//!
//! let embedder = Arc::new(HashEmbedder::new(384));
//! let vectors = VectorStore::new();
//! SyncPipeline::new(embedder.clone(), vectors.clone(), "article_titles")
//!     .rebuild(&store)
//!     .unwrap();
//!
//! let engine = QueryEngine::new(embedder, vectors, "article_titles");
//! let matches = engine
//!     .search(&store, "immune escape therapy", 5)
//!     .unwrap();
//! assert_eq!(matches[0].id, 1);
//! ```
//!
//! ## Crates
//!
//! - [`bunken_core`]: article types and embedding providers
//! - [`bunken_vecdb`]: the embedded vector store
//! - `bunken` (this crate): store, sync pipeline, query engine, and feeds

pub mod config;
pub mod error;
pub mod feed;
pub mod query;
pub mod store;
pub mod sync;

pub use bunken_core::{
    ArticleRecord, DEFAULT_DIMENSION, EmbedConfig, EmbedMode, Embedder, HashEmbedder,
    MiniLmEmbedder, NewArticle, build_embedder,
};
pub use bunken_vecdb::{
    CollectionInfo, DEFAULT_NLIST, DEFAULT_NPROBE, IndexKind, IndexParams, Metric, SearchParams,
    VectorStore,
};

pub use config::EngineConfig;
pub use error::{BunkenError, Result};
pub use feed::{ArticleFeed, IngestReport, NatureFeed, ingest_into};
pub use query::{ArticleMatch, QueryEngine};
pub use store::{ArticleRow, ArticleStore};
pub use sync::{LogObserver, RebuildReport, SyncEvent, SyncObserver, SyncPipeline};
