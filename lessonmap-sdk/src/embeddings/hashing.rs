//! Feature-hashed bag of words.
//!
//! Each word and each pair of adjacent words is hashed with SHA-256 into
//! one of `dimensions` buckets. Counts are never negative, so the cosine of
//! two vectors is always in [0, 1]. Texts sharing no words score 0 (barring
//! bucket collisions).

use sha2::{Digest, Sha256};

use crate::MapperResult;

use super::Embedder;

const MODEL_PREFIX: &str = "hashing-bow";

/// Deterministic embedder that needs no model download
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_id: format!("{}-{}", MODEL_PREFIX, dimensions),
        }
    }

    fn bucket(&self, feature: &str) -> usize {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(bytes) % self.dimensions as u64) as usize
    }

    /// Embed one text
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();

        for word in &words {
            vector[self.bucket(&format!("w:{}", word))] += 1.0;
        }
        for pair in words.windows(2) {
            vector[self.bucket(&format!("b:{} {}", pair[0], pair[1]))] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&mut self, texts: &[String]) -> MapperResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}
