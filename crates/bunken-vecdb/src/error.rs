use thiserror::Error;

use crate::types::{BuildState, Metric};

/// Errors from the embedded vector store.
#[derive(Debug, Error)]
pub enum VecDbError {
    /// No committed collection under this name. Either it was never built or
    /// its first build has not been loaded yet.
    #[error("collection {0:?} is not queryable")]
    CollectionMissing(String),

    /// A build operation was called out of protocol order.
    #[error("{operation} is invalid in build state {state}")]
    State {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the build handle was in.
        state: BuildState,
    },

    /// A vector's dimension does not match the collection dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The collection dimension.
        expected: usize,
        /// The offending vector's dimension.
        actual: usize,
    },

    /// A collection was created with a zero dimension.
    #[error("invalid collection dimension {0}")]
    InvalidDimension(usize),

    /// Index parameters name a different metric than the collection.
    #[error("metric mismatch: collection uses {collection}, index params use {params}")]
    MetricMismatch {
        /// Metric the collection was created with.
        collection: Metric,
        /// Metric in the index parameters.
        params: Metric,
    },

    /// The same id appeared twice within one bulk insert.
    #[error("duplicate id {0} in bulk insert")]
    DuplicateId(i64),

    /// The id and vector slices passed to a bulk insert differ in length.
    #[error("ids and vectors differ in length: {ids} vs {vectors}")]
    LengthMismatch {
        /// Number of ids.
        ids: usize,
        /// Number of vectors.
        vectors: usize,
    },

    /// Another build of the same collection is already in flight.
    #[error("a rebuild of collection {0:?} is already in progress")]
    RebuildInProgress(String),
}

/// Result type alias for vector store operations.
pub type Result<T> = std::result::Result<T, VecDbError>;
