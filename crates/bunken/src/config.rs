//! # Engine Configuration
//!
//! One configuration struct covering every component: the relational store
//! path, the embedding provider, the index and search parameters, and the
//! ingest feed. Defaults mirror a small self-hosted deployment; override
//! individual fields with the `with_*` builders.
//!
//! ## Quick Start
//!
//! ```
//! use bunken::config::EngineConfig;
//! use bunken_core::EmbedMode;
//!
//! let config = EngineConfig::default()
//!     .with_db_path("/tmp/bunken.db")
//!     .with_embed(bunken_core::EmbedConfig::default().with_mode(EmbedMode::Hash))
//!     .with_top_k(10);
//! assert_eq!(config.collection, "article_titles");
//! ```

use std::path::{Path, PathBuf};

use bunken_core::EmbedConfig;
use bunken_vecdb::{IndexParams, SearchParams};

/// Default relational store file.
pub const DEFAULT_DB_PATH: &str = "bunken.db";

/// Default name of the title vector collection.
pub const DEFAULT_COLLECTION: &str = "article_titles";

/// Default number of results returned per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Default number of titles embedded per batch during a rebuild.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default subject listing scraped on ingest.
pub const DEFAULT_FEED_URL: &str = "https://www.nature.com/subjects/oncology";

/// Configuration for the whole engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path of the SQLite database file.
    pub db_path: PathBuf,
    /// Name of the title vector collection.
    pub collection: String,
    /// Embedding provider selection.
    pub embed: EmbedConfig,
    /// Index build parameters used on rebuild.
    pub index: IndexParams,
    /// Search-time parameters.
    pub search: SearchParams,
    /// Results returned per query when the caller does not override.
    pub top_k: usize,
    /// Titles embedded per batch during a rebuild.
    pub batch_size: usize,
    /// Subject listing URL scraped on ingest.
    pub feed_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            collection: DEFAULT_COLLECTION.to_string(),
            embed: EmbedConfig::default(),
            index: IndexParams::default(),
            search: SearchParams::default(),
            top_k: DEFAULT_TOP_K,
            batch_size: DEFAULT_BATCH_SIZE,
            feed_url: DEFAULT_FEED_URL.to_string(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the SQLite database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl AsRef<Path>) -> Self {
        self.db_path = path.as_ref().to_path_buf();
        self
    }

    /// Sets the title collection name.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the embedding provider selection.
    #[must_use]
    pub fn with_embed(mut self, embed: EmbedConfig) -> Self {
        self.embed = embed;
        self
    }

    /// Sets the index build parameters.
    #[must_use]
    pub fn with_index(mut self, index: IndexParams) -> Self {
        self.index = index;
        self
    }

    /// Sets the search-time parameters.
    #[must_use]
    pub fn with_search(mut self, search: SearchParams) -> Self {
        self.search = search;
        self
    }

    /// Sets the default result count per query (minimum 1).
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Sets the embed batch size used on rebuild (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the subject listing URL scraped on ingest.
    #[must_use]
    pub fn with_feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.collection, DEFAULT_COLLECTION);
        assert_eq!(config.top_k, DEFAULT_TOP_K);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn builders_override_fields() {
        let config = EngineConfig::new()
            .with_db_path("/var/lib/bunken/articles.db")
            .with_collection("paper_titles")
            .with_top_k(20)
            .with_batch_size(8)
            .with_feed_url("https://www.nature.com/subjects/neuroscience");
        assert_eq!(config.db_path, PathBuf::from("/var/lib/bunken/articles.db"));
        assert_eq!(config.collection, "paper_titles");
        assert_eq!(config.top_k, 20);
        assert_eq!(config.batch_size, 8);
        assert!(config.feed_url.ends_with("neuroscience"));
    }

    #[test]
    fn zero_values_are_clamped() {
        let config = EngineConfig::new().with_top_k(0).with_batch_size(0);
        assert_eq!(config.top_k, 1);
        assert_eq!(config.batch_size, 1);
    }
}
