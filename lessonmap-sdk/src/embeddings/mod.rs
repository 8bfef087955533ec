//! Embedding port and implementations.
//!
//! The matcher only sees the [`Embedder`] trait. Two implementations ship
//! with the SDK:
//!
//! - [`FastEmbedder`]: local ONNX sentence model via `fastembed`
//!   (feature `embeddings`)
//! - [`HashingEmbedder`]: deterministic bag of words and bigrams, used for
//!   offline runs and tests
//!
//! Vectors for the taxonomy are memoized on disk by [`EmbeddingIndex`].

mod fastembed;
mod hashing;
pub mod index;

pub use self::fastembed::{FastEmbedder, model_dimensions};
pub use self::hashing::HashingEmbedder;
pub use self::index::{EmbeddingIndex, EmbeddingRole, IndexStatus};

use crate::MapperResult;
use crate::config::{EmbeddingBackend, EmbeddingConfig};

/// Something that turns text into fixed-length vectors
pub trait Embedder {
    /// Stable identifier of the model, part of the index content hash
    fn model_id(&self) -> &str;

    /// Length of every produced vector
    fn dimensions(&self) -> usize;

    /// Embed every text, one vector per input in the same order.
    fn embed_batch(&mut self, texts: &[String]) -> MapperResult<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&mut self, text: &str) -> MapperResult<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| crate::MapperError::embedding("No embedding generated"))
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed_batch(&mut self, texts: &[String]) -> MapperResult<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }
}

/// Build the embedder selected by the configuration
pub fn from_config(config: &EmbeddingConfig) -> MapperResult<Box<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::FastEmbed => Ok(Box::new(FastEmbedder::new(
            &config.model,
            config.batch_size,
        )?)),
        EmbeddingBackend::Hashing => Ok(Box::new(HashingEmbedder::new(config.hashing_dimensions))),
    }
}

/// Compute cosine similarity between two vectors
///
/// Returns a value between -1.0 and 1.0, where 1.0 means identical,
/// 0.0 means orthogonal, and -1.0 means opposite. Vectors of different
/// length or with zero norm score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine similarity clamped to the [0, 1] score range
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    let score = cosine_similarity(a, b);
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}
