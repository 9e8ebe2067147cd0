//! # Bunken VecDB
//!
//! Embedded vector collections for title search. Holds named sets of
//! `(id, vector)` entries behind a staged build protocol and answers
//! nearest-neighbor queries through an IVF-Flat index, so the engine needs
//! no external vector database.
//!
//! ## Quick Start
//!
//! ```rust
//! use bunken_vecdb::{IndexParams, Metric, SearchParams, VectorStore};
//!
//! let store = VectorStore::new();
//! let mut build = store.recreate("titles", 4, Metric::L2).unwrap();
//! build.bulk_insert(&[1, 2], vec![vec![0.0; 4], vec![1.0; 4]]).unwrap();
//! build.build_index(&IndexParams::default()).unwrap();
//! build.load().unwrap();
//!
//! let hits = store.search("titles", &[1.0; 4], 1, &SearchParams::default()).unwrap();
//! assert_eq!(hits[0].id, 2);
//! assert_eq!(hits[0].distance, 0.0);
//! ```
pub mod distance;
pub mod error;
mod index;
pub mod store;
pub mod types;

// Re-export primary API
pub use error::{Result, VecDbError};
pub use store::{CollectionHandle, VectorStore};
pub use types::{
    BuildState, CollectionInfo, DEFAULT_NLIST, DEFAULT_NPROBE, IndexKind, IndexParams, Metric,
    SearchHit, SearchParams,
};
