use serde::{Deserialize, Serialize};

/// Default number of inverted lists for IVF-Flat.
pub const DEFAULT_NLIST: usize = 128;

/// Default number of inverted lists probed per search.
pub const DEFAULT_NPROBE: usize = 10;

/// Distance metric of a collection. Lower distance always means more similar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// `1 - cosine similarity`, in `[0, 2]`.
    Cosine,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::L2 => write!(f, "l2"),
            Metric::Cosine => write!(f, "cosine"),
        }
    }
}

/// Index structure to build over a collection's vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Inverted-file index with a k-means coarse quantizer.
    #[default]
    IvfFlat,
    /// Exhaustive scan over all vectors.
    Flat,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::IvfFlat => write!(f, "ivf_flat"),
            IndexKind::Flat => write!(f, "flat"),
        }
    }
}

/// Parameters for building the ANN structure of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Index structure.
    pub kind: IndexKind,
    /// Metric; must equal the metric the collection was created with.
    pub metric: Metric,
    /// Number of inverted lists. Ignored for [`IndexKind::Flat`].
    pub nlist: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            kind: IndexKind::IvfFlat,
            metric: Metric::L2,
            nlist: DEFAULT_NLIST,
        }
    }
}

impl IndexParams {
    /// Create index parameters with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index structure.
    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the number of inverted lists. Clamped to at least 1.
    pub fn with_nlist(mut self, nlist: usize) -> Self {
        self.nlist = nlist.max(1);
        self
    }
}

/// Parameters applied per search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// How many inverted lists to probe. Clamped to `[1, nlist]` at search
    /// time; irrelevant for flat scans.
    pub nprobe: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            nprobe: DEFAULT_NPROBE,
        }
    }
}

impl SearchParams {
    /// Create search parameters with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of probed lists. Clamped to at least 1.
    pub fn with_nprobe(mut self, nprobe: usize) -> Self {
        self.nprobe = nprobe.max(1);
        self
    }
}

/// One nearest-neighbor match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier the vector was inserted under.
    pub id: i64,
    /// Distance to the query under the collection metric.
    pub distance: f32,
}

/// Lifecycle of a staged collection build.
///
/// A build handle moves `Created` → `Populated` → `Indexed`; `load` consumes
/// the handle and commits the collection, making it queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Fresh and empty; accepts one bulk insert.
    Created,
    /// Vectors inserted; awaiting index build.
    Populated,
    /// ANN structure built; awaiting load.
    Indexed,
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildState::Created => write!(f, "created"),
            BuildState::Populated => write!(f, "populated"),
            BuildState::Indexed => write!(f, "indexed"),
        }
    }
}

/// Snapshot of a committed collection, for status output and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Distance metric.
    pub metric: Metric,
    /// Number of stored vectors.
    pub entries: usize,
    /// Effective index structure (small collections degrade to flat scan).
    pub index_kind: IndexKind,
    /// Effective number of inverted lists (0 for flat scans).
    pub nlist: usize,
}
