//! Local sentence embeddings via `fastembed`.
//!
//! The model is loaded on first use and kept for the lifetime of the
//! embedder. Without the `embeddings` feature every call fails with an
//! embedding error.

use crate::{MapperError, MapperResult};

use super::Embedder;

/// Vector length of the supported models
pub fn model_dimensions(model: &str) -> Option<usize> {
    match model {
        "paraphrase-multilingual-MiniLM-L12-v2" => Some(384),
        "paraphrase-multilingual-mpnet-base-v2" => Some(768),
        "all-MiniLM-L6-v2" => Some(384),
        "multilingual-e5-small" => Some(384),
        _ => None,
    }
}

/// Embedder backed by a local ONNX model
pub struct FastEmbedder {
    model_name: String,
    dimensions: usize,
    #[cfg_attr(not(feature = "embeddings"), allow(dead_code))]
    batch_size: usize,
    #[cfg(feature = "embeddings")]
    model: Option<::fastembed::TextEmbedding>,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl FastEmbedder {
    /// Create an embedder for a supported model name.
    ///
    /// Fails for unknown model names. The model itself is not loaded yet.
    pub fn new(model_name: &str, batch_size: usize) -> MapperResult<Self> {
        let dimensions = model_dimensions(model_name)
            .ok_or_else(|| MapperError::embedding(format!("Unsupported embedding model: {}", model_name)))?;

        Ok(Self {
            model_name: model_name.to_string(),
            dimensions,
            batch_size: batch_size.max(1),
            #[cfg(feature = "embeddings")]
            model: None,
        })
    }

    /// Check if the model is loaded
    pub fn is_loaded(&self) -> bool {
        #[cfg(feature = "embeddings")]
        {
            self.model.is_some()
        }
        #[cfg(not(feature = "embeddings"))]
        {
            false
        }
    }
}

#[cfg(feature = "embeddings")]
impl FastEmbedder {
    fn model_kind(&self) -> MapperResult<::fastembed::EmbeddingModel> {
        use ::fastembed::EmbeddingModel;

        match self.model_name.as_str() {
            "paraphrase-multilingual-MiniLM-L12-v2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
            "paraphrase-multilingual-mpnet-base-v2" => Ok(EmbeddingModel::ParaphraseMLMpnetBaseV2),
            "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
            other => Err(MapperError::embedding(format!("Unsupported embedding model: {}", other))),
        }
    }

    /// Load the model if it is not loaded yet
    pub fn ensure_model(&mut self) -> MapperResult<&::fastembed::TextEmbedding> {
        use ::fastembed::{InitOptions, TextEmbedding};

        if self.model.is_none() {
            tracing::info!(model = %self.model_name, "Loading embedding model");
            let start = std::time::Instant::now();

            let mut init_options = InitOptions::default();
            init_options.model_name = self.model_kind()?;
            init_options.show_download_progress = false;

            let model = TextEmbedding::try_new(init_options)
                .map_err(|e| MapperError::embedding(format!("Failed to load embedding model: {}", e)))?;

            tracing::info!("Embedding model loaded in {:?}", start.elapsed());
            self.model = Some(model);
        }

        self.model
            .as_ref()
            .ok_or_else(|| MapperError::embedding("Embedding model not initialized"))
    }
}

#[cfg(feature = "embeddings")]
impl Embedder for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&mut self, texts: &[String]) -> MapperResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batch_size = self.batch_size;
        let model = self.ensure_model()?;
        let vectors = model
            .embed(texts.to_vec(), Some(batch_size))
            .map_err(|e| MapperError::embedding(format!("Failed to generate embeddings: {}", e)))?;

        if vectors.len() != texts.len() {
            return Err(MapperError::embedding(format!(
                "Model returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

#[cfg(not(feature = "embeddings"))]
impl Embedder for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&mut self, _texts: &[String]) -> MapperResult<Vec<Vec<f32>>> {
        Err(MapperError::embedding(
            "Embeddings feature not enabled. Compile with --features embeddings",
        ))
    }
}
