//! Distance functions. Both metrics return non-negative values where lower
//! means more similar, so hit ordering is uniform across metrics.

use crate::types::Metric;

/// Distance between two vectors under `metric`.
///
/// Callers are responsible for equal dimensions; mismatches are a caller bug
/// and only checked in debug builds.
#[must_use]
pub fn distance(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");
    match metric {
        Metric::L2 => l2_squared(a, b),
        Metric::Cosine => cosine_distance(a, b),
    }
}

/// Squared Euclidean distance.
#[must_use]
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// `1 - cosine similarity`, in `[0, 2]`. Zero-norm inputs are treated as
/// maximally dissimilar to everything.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}
