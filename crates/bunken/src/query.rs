//! # Query Engine
//!
//! Two-stage semantic search: embed the query text, search the title
//! collection for the nearest vectors, then fan out to the relational store
//! for the display fields. Results come back in similarity order (closest
//! first) even though the store returns rows in its own order, and a hit
//! whose article row has been deleted since the last rebuild is dropped
//! rather than failing the query.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use bunken_core::Embedder;
use bunken_vecdb::{SearchHit, SearchParams, VectorStore};

use crate::error::Result;
use crate::store::{ArticleRow, ArticleStore};

/// A ranked article match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleMatch {
    /// Article identifier.
    pub id: i64,
    /// Article title.
    pub title: String,
    /// Article abstract.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Distance of the title vector from the query (lower is closer).
    pub distance: f32,
}

/// Executes two-stage searches against one collection.
///
/// Construct it with the same embedding provider the collection was built
/// with; mixing providers puts query vectors in a different space than the
/// indexed titles.
pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    vectors: VectorStore,
    collection: String,
    params: SearchParams,
}

impl QueryEngine {
    /// Creates an engine querying `collection` inside `vectors`.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: VectorStore,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            vectors,
            collection: collection.into(),
            params: SearchParams::default(),
        }
    }

    /// Sets the search-time parameters.
    #[must_use]
    pub fn with_search_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    /// Collection name this engine queries.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Searches for the `top_k` articles whose titles are closest to
    /// `query`, closest first.
    ///
    /// Fails fast when the collection has never been committed
    /// ([`bunken_vecdb::VecDbError::CollectionMissing`]) or when the query
    /// embeds to nothing ([`bunken_core::EmbedError::EmptyInput`]).
    pub fn search(
        &self,
        store: &ArticleStore,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ArticleMatch>> {
        let vector = self.embedder.embed(query)?;
        let hits = self
            .vectors
            .search(&self.collection, &vector, top_k, &self.params)?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = hits.iter().map(|hit| hit.id).collect();
        let rows = store.fetch_by_ids(&ids)?;
        Ok(align_rows(&hits, rows))
    }
}

/// Joins search hits with their article rows, preserving hit order.
///
/// The store returns rows keyed and ordered its own way, so the join goes
/// through an id map. A hit without a row is stale (its article was deleted
/// after the last rebuild) and is dropped with a warning.
fn align_rows(hits: &[SearchHit], rows: Vec<ArticleRow>) -> Vec<ArticleMatch> {
    let mut by_id: HashMap<i64, ArticleRow> = rows.into_iter().map(|row| (row.id, row)).collect();
    let mut matches = Vec::with_capacity(hits.len());
    for hit in hits {
        match by_id.remove(&hit.id) {
            Some(row) => matches.push(ArticleMatch {
                id: row.id,
                title: row.title,
                abstract_text: row.abstract_text,
                distance: hit.distance,
            }),
            None => {
                tracing::warn!(id = hit.id, "vector hit has no article row, dropping");
            }
        }
    }
    matches
}
