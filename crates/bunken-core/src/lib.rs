//! # Bunken Core
//!
//! Shared foundation of the bunken literature-search engine: article record
//! types and the embedding providers that map titles and queries into
//! fixed-dimension vectors.
//!
//! ## Quick Start
//!
//! ```rust
//! use bunken_core::embed::{Embedder, HashEmbedder};
//!
//! let embedder = HashEmbedder::new(384);
//! let vector = embedder.embed("EP2-signaling blockade in glioblastoma").unwrap();
//!
//! assert_eq!(vector.len(), 384);
//! assert_eq!(vector, embedder.embed("EP2-signaling blockade in glioblastoma").unwrap());
//! ```
pub mod embed;
pub mod error;
pub mod types;

// Re-export primary API
pub use embed::{
    DEFAULT_DIMENSION, EmbedConfig, EmbedMode, Embedder, HashEmbedder, MiniLmEmbedder,
    build_embedder,
};
pub use error::{EmbedError, Result};
pub use types::{ArticleRecord, NewArticle};
