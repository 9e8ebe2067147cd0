//! # IVF-Flat Index
//!
//! Inverted-file index: vectors are partitioned into `nlist` lists by a
//! k-means coarse quantizer, and a search scans only the `nprobe` lists whose
//! centroids are nearest to the query. Collections no larger than `nlist`
//! degrade to an exhaustive flat scan, where IVF buys nothing.

use crate::distance::distance;
use crate::types::{IndexKind, IndexParams, Metric, SearchHit};

/// Lloyd iterations for the coarse quantizer. Assignment stabilizes much
/// earlier on title-scale collections; the loop exits on convergence.
const KMEANS_ITERATIONS: usize = 10;

/// ANN structure over a frozen entry slice. Entries are owned by the
/// collection; the index stores positions into that slice.
#[derive(Debug, Clone)]
pub(crate) struct IvfFlatIndex {
    kind: IndexKind,
    nlist: usize,
    centroids: Vec<Vec<f32>>,
    lists: Vec<Vec<u32>>,
}

impl IvfFlatIndex {
    /// Builds the index over `entries`. Infallible: degenerate shapes
    /// (empty or small collections, `Flat` params) yield a flat scan.
    pub(crate) fn build(
        entries: &[(i64, Vec<f32>)],
        dimension: usize,
        metric: Metric,
        params: &IndexParams,
    ) -> Self {
        let count = entries.len();
        let nlist = params.nlist.max(1);
        if params.kind == IndexKind::Flat || count <= nlist {
            return Self {
                kind: IndexKind::Flat,
                nlist: 0,
                centroids: Vec::new(),
                lists: Vec::new(),
            };
        }

        // Seed centroids with an evenly spaced sample, keeping the build
        // deterministic for a given entry order.
        let mut centroids: Vec<Vec<f32>> = (0..nlist)
            .map(|list| entries[list * count / nlist].1.clone())
            .collect();
        let mut assignments = vec![0usize; count];

        for _ in 0..KMEANS_ITERATIONS {
            // Assignment step
            let mut moved = false;
            for (position, (_, vector)) in entries.iter().enumerate() {
                let best = nearest_centroid(&centroids, vector, metric);
                if assignments[position] != best {
                    assignments[position] = best;
                    moved = true;
                }
            }
            if !moved {
                break;
            }

            // Update step; empty lists keep their previous centroid
            let mut sums = vec![vec![0.0f32; dimension]; nlist];
            let mut counts = vec![0usize; nlist];
            for (position, (_, vector)) in entries.iter().enumerate() {
                let list = assignments[position];
                counts[list] += 1;
                for (sum, component) in sums[list].iter_mut().zip(vector) {
                    *sum += component;
                }
            }
            for (list, sum) in sums.into_iter().enumerate() {
                if counts[list] > 0 {
                    let scale = counts[list] as f32;
                    centroids[list] = sum.into_iter().map(|s| s / scale).collect();
                }
            }
        }

        // Final assignment against the settled centroids, so every vector
        // lives in the list of its nearest centroid.
        let mut lists: Vec<Vec<u32>> = vec![Vec::new(); nlist];
        for (position, (_, vector)) in entries.iter().enumerate() {
            lists[nearest_centroid(&centroids, vector, metric)].push(position as u32);
        }

        Self {
            kind: IndexKind::IvfFlat,
            nlist,
            centroids,
            lists,
        }
    }

    /// Returns up to `top_k` hits ordered ascending by distance.
    pub(crate) fn search(
        &self,
        entries: &[(i64, Vec<f32>)],
        query: &[f32],
        top_k: usize,
        nprobe: usize,
        metric: Metric,
    ) -> Vec<SearchHit> {
        if top_k == 0 || entries.is_empty() {
            return Vec::new();
        }

        match self.kind {
            IndexKind::Flat => rank(entries, 0..entries.len() as u32, query, top_k, metric),
            IndexKind::IvfFlat => {
                // Probe the nprobe nearest lists
                let nprobe = nprobe.clamp(1, self.nlist);
                let mut by_centroid: Vec<(usize, f32)> = self
                    .centroids
                    .iter()
                    .enumerate()
                    .map(|(list, centroid)| (list, distance(metric, query, centroid)))
                    .collect();
                by_centroid.sort_by(|a, b| a.1.total_cmp(&b.1));

                let candidates = by_centroid[..nprobe]
                    .iter()
                    .flat_map(|&(list, _)| self.lists[list].iter().copied());
                rank(entries, candidates, query, top_k, metric)
            }
        }
    }

    /// Effective index structure.
    pub(crate) fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Effective list count (0 for flat scans).
    pub(crate) fn nlist(&self) -> usize {
        self.nlist
    }
}

fn nearest_centroid(centroids: &[Vec<f32>], vector: &[f32], metric: Metric) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (list, centroid) in centroids.iter().enumerate() {
        let d = distance(metric, vector, centroid);
        if d < best_distance {
            best = list;
            best_distance = d;
        }
    }
    best
}

/// Scores the candidate positions and keeps the `top_k` nearest. Ties keep
/// insertion order, so results are deterministic.
fn rank(
    entries: &[(i64, Vec<f32>)],
    candidates: impl Iterator<Item = u32>,
    query: &[f32],
    top_k: usize,
    metric: Metric,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = candidates
        .map(|position| {
            let (id, vector) = &entries[position as usize];
            SearchHit {
                id: *id,
                distance: distance(metric, query, vector),
            }
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits.truncate(top_k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic synthetic vectors spread over a few loose clusters.
    /// The per-entry term keeps every vector unique, so distance ties cannot
    /// make orderings ambiguous.
    fn synthetic_entries(count: usize, dimension: usize) -> Vec<(i64, Vec<f32>)> {
        (0..count)
            .map(|i| {
                let center = (i % 5) as f32 * 10.0;
                let vector = (0..dimension)
                    .map(|d| {
                        center + ((i * 31 + d * 17) % 13) as f32 * 0.05 + i as f32 * 0.001
                    })
                    .collect();
                (i as i64 + 1, vector)
            })
            .collect()
    }

    #[test]
    fn small_collection_degrades_to_flat() {
        let entries = synthetic_entries(10, 4);
        let index = IvfFlatIndex::build(&entries, 4, Metric::L2, &IndexParams::new().with_nlist(128));
        assert_eq!(index.kind(), IndexKind::Flat);
        assert_eq!(index.nlist(), 0);
    }

    #[test]
    fn empty_collection_searches_empty() {
        let index = IvfFlatIndex::build(&[], 4, Metric::L2, &IndexParams::default());
        let hits = index.search(&[], &[0.0; 4], 5, 10, Metric::L2);
        assert!(hits.is_empty());
    }

    #[test]
    fn exact_vector_is_top_hit_with_zero_distance() {
        let entries = synthetic_entries(200, 8);
        let index = IvfFlatIndex::build(&entries, 8, Metric::L2, &IndexParams::new().with_nlist(16));
        assert_eq!(index.kind(), IndexKind::IvfFlat);

        for probe in [3usize, 57, 140, 199] {
            let (id, vector) = &entries[probe];
            let hits = index.search(&entries, vector, 5, 4, Metric::L2);
            assert_eq!(hits[0].id, *id);
            assert_eq!(hits[0].distance, 0.0);
        }
    }

    #[test]
    fn hits_are_ordered_ascending() {
        let entries = synthetic_entries(200, 8);
        let index = IvfFlatIndex::build(&entries, 8, Metric::L2, &IndexParams::new().with_nlist(16));
        let hits = index.search(&entries, &entries[42].1, 10, 16, Metric::L2);
        assert!(hits.len() <= 10);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn top_k_zero_returns_nothing() {
        let entries = synthetic_entries(50, 4);
        let index = IvfFlatIndex::build(&entries, 4, Metric::L2, &IndexParams::default());
        assert!(index.search(&entries, &entries[0].1, 0, 10, Metric::L2).is_empty());
    }

    fn flat_params() -> IndexParams {
        IndexParams::new().with_kind(IndexKind::Flat)
    }

    #[test]
    fn top_k_larger_than_collection_is_capped() {
        let entries = synthetic_entries(7, 4);
        let index = IvfFlatIndex::build(&entries, 4, Metric::L2, &flat_params());
        let hits = index.search(&entries, &entries[0].1, 100, 10, Metric::L2);
        assert_eq!(hits.len(), 7);
    }

    #[test]
    fn full_probe_matches_flat_scan() {
        let entries = synthetic_entries(200, 8);
        let ivf = IvfFlatIndex::build(&entries, 8, Metric::L2, &IndexParams::new().with_nlist(16));
        let flat = IvfFlatIndex::build(&entries, 8, Metric::L2, &flat_params());

        let query: Vec<f32> = entries[11].1.iter().map(|v| v + 0.01).collect();
        let ivf_hits = ivf.search(&entries, &query, 5, 16, Metric::L2);
        let flat_hits = flat.search(&entries, &query, 5, 16, Metric::L2);
        assert_eq!(ivf_hits, flat_hits);
    }

    #[test]
    fn cosine_metric_ranks_by_angle() {
        let entries = vec![
            (1, vec![1.0, 0.0]),
            (2, vec![0.7, 0.7]),
            (3, vec![0.0, 1.0]),
        ];
        let index = IvfFlatIndex::build(&entries, 2, Metric::Cosine, &flat_params());
        let hits = index.search(&entries, &[10.0, 0.0], 3, 1, Metric::Cosine);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[2].id, 3);
    }
}
