//! # Vector Store
//!
//! Named, in-memory vector collections with a staged build protocol. A
//! rebuild stages its data on an exclusive [`CollectionHandle`] and only
//! [`CollectionHandle::load`] makes the result visible, atomically replacing
//! the previous version. Queries therefore see either the old committed
//! collection or the new one, never a half-built state; while no committed
//! version exists they fail fast instead of blocking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Result, VecDbError};
use crate::index::IvfFlatIndex;
use crate::types::{
    BuildState, CollectionInfo, IndexKind, IndexParams, Metric, SearchHit, SearchParams,
};

/// A committed, immutable collection version.
#[derive(Debug)]
struct Committed {
    dimension: usize,
    metric: Metric,
    entries: Vec<(i64, Vec<f32>)>,
    index: IvfFlatIndex,
}

#[derive(Debug, Default)]
struct StoreInner {
    collections: RwLock<HashMap<String, Arc<Committed>>>,
    building: Mutex<HashSet<String>>,
}

/// Handle to the embedded vector store. Cheap to clone; clones share the
/// same registry of collections.
#[derive(Clone, Default)]
pub struct VectorStore {
    inner: Arc<StoreInner>,
}

impl VectorStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a fresh, empty build for `name` (the Created state).
    ///
    /// The previously committed collection, if any, keeps answering queries
    /// until the new build's `load` commits. At most one build per name may
    /// be in flight; a concurrent attempt fails with
    /// [`VecDbError::RebuildInProgress`]. Dropping the returned handle
    /// without loading discards the staged data and frees the name.
    pub fn recreate(&self, name: &str, dimension: usize, metric: Metric) -> Result<CollectionHandle> {
        if dimension == 0 {
            return Err(VecDbError::InvalidDimension(0));
        }
        let mut building = self.inner.building.lock();
        if !building.insert(name.to_string()) {
            return Err(VecDbError::RebuildInProgress(name.to_string()));
        }
        drop(building);

        tracing::debug!(collection = name, dimension, %metric, "staging collection build");
        Ok(CollectionHandle {
            store: Arc::clone(&self.inner),
            name: name.to_string(),
            dimension,
            metric,
            state: BuildState::Created,
            entries: Vec::new(),
            index: None,
        })
    }

    /// Searches the committed collection `name`.
    ///
    /// Returns up to `top_k` hits ordered ascending by distance; an empty
    /// committed collection yields an empty result. Fails fast with
    /// [`VecDbError::CollectionMissing`] when no build has been committed.
    pub fn search(
        &self,
        name: &str,
        query: &[f32],
        top_k: usize,
        params: &SearchParams,
    ) -> Result<Vec<SearchHit>> {
        let committed = self
            .inner
            .collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| VecDbError::CollectionMissing(name.to_string()))?;
        if query.len() != committed.dimension {
            return Err(VecDbError::DimensionMismatch {
                expected: committed.dimension,
                actual: query.len(),
            });
        }
        Ok(committed
            .index
            .search(&committed.entries, query, top_k, params.nprobe, committed.metric))
    }

    /// Returns `true` if a committed collection exists under `name`.
    #[must_use]
    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.read().contains_key(name)
    }

    /// The ids stored in the committed collection, in insertion order.
    pub fn ids(&self, name: &str) -> Result<Vec<i64>> {
        let committed = self
            .inner
            .collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| VecDbError::CollectionMissing(name.to_string()))?;
        Ok(committed.entries.iter().map(|(id, _)| *id).collect())
    }

    /// Snapshot of a committed collection, or `None` if there is none.
    #[must_use]
    pub fn describe(&self, name: &str) -> Option<CollectionInfo> {
        let committed = self.inner.collections.read().get(name).cloned()?;
        Some(CollectionInfo {
            name: name.to_string(),
            dimension: committed.dimension,
            metric: committed.metric,
            entries: committed.entries.len(),
            index_kind: committed.index.kind(),
            nlist: committed.index.nlist(),
        })
    }

    /// Removes the committed collection. Returns `true` if one existed.
    /// An in-flight build of the same name is unaffected.
    pub fn drop_collection(&self, name: &str) -> bool {
        self.inner.collections.write().remove(name).is_some()
    }
}

/// Exclusive handle to an in-progress collection build.
///
/// Drives the build through `Created → Populated → Indexed`; [`Self::load`]
/// consumes the handle and commits the collection. Out-of-order calls fail
/// with [`VecDbError::State`].
#[derive(Debug)]
pub struct CollectionHandle {
    store: Arc<StoreInner>,
    name: String,
    dimension: usize,
    metric: Metric,
    state: BuildState,
    entries: Vec<(i64, Vec<f32>)>,
    index: Option<IvfFlatIndex>,
}

impl CollectionHandle {
    /// Collection name this build will commit under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vector dimension of the collection.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Current build state.
    #[must_use]
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Effective index structure, available once the index is built. The
    /// kind can differ from the requested one when the entry count is small
    /// enough that the build degrades to a flat scan.
    #[must_use]
    pub fn index_kind(&self) -> Option<IndexKind> {
        self.index.as_ref().map(IvfFlatIndex::kind)
    }

    /// Inserts all entries for this build in one call (Created → Populated).
    ///
    /// `ids[i]` labels `vectors[i]`. Ids must be unique within the call and
    /// every vector must match the collection dimension.
    pub fn bulk_insert(&mut self, ids: &[i64], vectors: Vec<Vec<f32>>) -> Result<()> {
        if self.state != BuildState::Created {
            return Err(VecDbError::State {
                operation: "bulk_insert",
                state: self.state,
            });
        }
        if ids.len() != vectors.len() {
            return Err(VecDbError::LengthMismatch {
                ids: ids.len(),
                vectors: vectors.len(),
            });
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for (id, vector) in ids.iter().zip(&vectors) {
            if vector.len() != self.dimension {
                return Err(VecDbError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
            if !seen.insert(*id) {
                return Err(VecDbError::DuplicateId(*id));
            }
        }

        self.entries = ids.iter().copied().zip(vectors).collect();
        self.state = BuildState::Populated;
        Ok(())
    }

    /// Builds the ANN structure (Created or Populated → Indexed).
    ///
    /// Calling this straight from Created covers the legitimate empty
    /// rebuild; the committed collection will answer every search with an
    /// empty result.
    pub fn build_index(&mut self, params: &IndexParams) -> Result<()> {
        if !matches!(self.state, BuildState::Created | BuildState::Populated) {
            return Err(VecDbError::State {
                operation: "build_index",
                state: self.state,
            });
        }
        if params.metric != self.metric {
            return Err(VecDbError::MetricMismatch {
                collection: self.metric,
                params: params.metric,
            });
        }

        self.index = Some(IvfFlatIndex::build(
            &self.entries,
            self.dimension,
            self.metric,
            params,
        ));
        self.state = BuildState::Indexed;
        Ok(())
    }

    /// Commits the build (Indexed → Queryable).
    ///
    /// The collection becomes visible under its name in one registry write,
    /// replacing any previous version. Consumes the handle; the build slot
    /// is released when it drops.
    pub fn load(mut self) -> Result<()> {
        if self.state != BuildState::Indexed {
            return Err(VecDbError::State {
                operation: "load",
                state: self.state,
            });
        }
        let index = self.index.take().ok_or(VecDbError::State {
            operation: "load",
            state: self.state,
        })?;

        let committed = Arc::new(Committed {
            dimension: self.dimension,
            metric: self.metric,
            entries: std::mem::take(&mut self.entries),
            index,
        });
        let replaced = self
            .store
            .collections
            .write()
            .insert(self.name.clone(), committed)
            .is_some();
        tracing::debug!(collection = %self.name, replaced, "collection build committed");
        Ok(())
    }
}

impl Drop for CollectionHandle {
    fn drop(&mut self) {
        // Frees the build slot whether the handle committed or was abandoned.
        self.store.building.lock().remove(&self.name);
    }
}
