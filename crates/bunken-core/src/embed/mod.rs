//! # Embedding Providers
//!
//! Turns article titles and query text into fixed-dimension vectors. All
//! providers are deterministic: the same text always maps to the same vector,
//! which is what makes index build and query embedding comparable.

pub mod hash;
pub mod neural;
pub mod unified;

pub use hash::HashEmbedder;
pub use neural::MiniLmEmbedder;
pub use unified::{EmbedConfig, EmbedMode, build_embedder};

use crate::error::Result;

/// Output dimension of the default sentence-embedding model.
pub const DEFAULT_DIMENSION: usize = 384;

/// A deterministic text-to-vector function.
///
/// One provider instance must serve both index builds and query embedding;
/// mixing vectors from different providers (or different dimensions) in one
/// collection is meaningless.
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    ///
    /// Fails with [`crate::EmbedError::EmptyInput`] when the text is empty,
    /// whitespace-only, or carries no indexable tokens. Blank text is never
    /// silently embedded as a zero vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds a batch of texts, preserving input order.
    ///
    /// Equivalent to mapping [`Embedder::embed`] over the slice; providers
    /// override this when batching is cheaper.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// The fixed dimension of every vector this provider produces.
    fn dimension(&self) -> usize;

    /// A short identifier for the provider, used in logs and status output.
    fn model_id(&self) -> &str;
}
