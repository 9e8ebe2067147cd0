//! # Hash Embedder
//!
//! Feature-hashing provider: tokens are hashed into signed buckets and the
//! result is L2-normalized. Carries no semantic knowledge, but it is fast,
//! dependency-free, and stable across releases, which makes it the default
//! for tests and the fallback when no model checkpoint is available.

use crate::embed::Embedder;
use crate::error::{EmbedError, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Weight of adjacent-token pair features relative to single tokens.
const BIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Creates a hash embedder producing vectors of `dimension` components.
    ///
    /// `dimension` must be non-zero.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        debug_assert!(dimension > 0, "embedding dimension must be non-zero");
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(crate::embed::DEFAULT_DIMENSION)
    }
}

/// FNV-1a. Implemented here so vectors stay identical across releases,
/// unlike `DefaultHasher` whose output is unspecified.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a_pair(first: &str, second: &str) -> u64 {
    let mut hash = fnv1a(first.as_bytes());
    hash ^= u64::from(0x1fu8);
    hash = hash.wrapping_mul(FNV_PRIME);
    for &byte in second.as_bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let mut vector = vec![0.0f32; self.dimension];
        let mut bump = |hash: u64, weight: f32| {
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign * weight;
        };

        for token in &tokens {
            bump(fnv1a(token.as_bytes()), 1.0);
        }
        for pair in tokens.windows(2) {
            bump(fnv1a_pair(pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for component in &mut vector {
                *component /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "hash-fnv1a"
    }
}
