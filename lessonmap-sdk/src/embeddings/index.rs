//! On-disk memoization of taxonomy vectors.
//!
//! One file per role (`subjects.emb`, `topics.emb`, `fallback.emb`) holds
//! the `{text, vector}` records plus a SHA-256 hash over the model id and
//! the normalized texts. A file whose hash, texts, record count or vector
//! length disagree with the current request is stale and gets recomputed.
//! A file that cannot be decoded is treated the same way.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lessonmap_core::text::normalize;
use serde::{Deserialize, Serialize};

use crate::utils::texts_hash;
use crate::{MapperError, MapperResult};

use super::Embedder;

/// Bumped whenever [`IndexFile`] changes shape
const INDEX_FORMAT_VERSION: u32 = 1;

/// Which family of taxonomy strings a vector set covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddingRole {
    /// Subject names
    Subjects,
    /// Topics of every subject, subject by subject
    Topics,
    /// Flattened fallback list
    Fallback,
}

impl EmbeddingRole {
    pub const ALL: [EmbeddingRole; 3] = [Self::Subjects, Self::Topics, Self::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subjects => "subjects",
            Self::Topics => "topics",
            Self::Fallback => "fallback",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Subjects => "subjects.emb",
            Self::Topics => "topics.emb",
            Self::Fallback => "fallback.emb",
        }
    }
}

impl std::fmt::Display for EmbeddingRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRecord {
    text: String,
    vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    model_id: String,
    content_hash: String,
    created_at: DateTime<Utc>,
    records: Vec<IndexRecord>,
}

impl IndexFile {
    /// Why this file cannot serve `texts`, if it cannot
    fn staleness(&self, model_id: &str, dimensions: usize, texts: &[String], hash: &str) -> Option<String> {
        if self.version != INDEX_FORMAT_VERSION {
            return Some(format!("format version {} != {}", self.version, INDEX_FORMAT_VERSION));
        }
        if self.model_id != model_id {
            return Some(format!("model {} != {}", self.model_id, model_id));
        }
        if self.content_hash != hash {
            return Some("content hash changed".to_string());
        }
        if self.records.len() != texts.len() {
            return Some(format!("{} records for {} texts", self.records.len(), texts.len()));
        }
        if self.records.iter().zip(texts).any(|(r, t)| &r.text != t) {
            return Some("texts changed".to_string());
        }
        if self.records.iter().any(|r| r.vector.len() != dimensions) {
            return Some("vector length changed".to_string());
        }
        None
    }
}

/// State of one role file, as reported by [`EmbeddingIndex::status`]
#[derive(Debug, Clone, PartialEq)]
pub enum IndexStatus {
    /// No file on disk
    Missing,
    /// File matches the current texts and model
    Fresh { records: usize, created_at: DateTime<Utc> },
    /// File exists but was built from other texts or another model
    Stale { reason: String },
    /// File cannot be decoded
    Corrupt { reason: String },
}

impl IndexStatus {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }
}

/// Directory of per-role vector files
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    dir: PathBuf,
}

impl EmbeddingIndex {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `role`
    pub fn path(&self, role: EmbeddingRole) -> PathBuf {
        self.dir.join(role.file_name())
    }

    fn read(&self, role: EmbeddingRole) -> MapperResult<Option<IndexFile>> {
        let path = self.path(role);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| MapperError::index(format!("{}: {}", path.display(), e)))
    }

    fn write(&self, role: EmbeddingRole, file: &IndexFile) -> MapperResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let bytes = bincode::serialize(file)
            .map_err(|e| MapperError::index(format!("Failed to encode {} index: {}", role, e)))?;
        let path = self.path(role);
        let tmp_path = path.with_extension("emb.tmp");
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Vectors for `texts`, read from disk when fresh and computed otherwise.
    ///
    /// Texts are normalized before hashing and embedding. Freshly computed
    /// vectors are written through to disk; a failed write is logged and the
    /// vectors are still returned.
    pub fn get_or_compute(
        &self,
        embedder: &mut dyn Embedder,
        role: EmbeddingRole,
        texts: &[String],
    ) -> MapperResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            tracing::warn!(role = %role, "No texts to embed");
            return Ok(Vec::new());
        }

        let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();
        let hash = texts_hash(embedder.model_id(), &normalized);

        match self.read(role) {
            Ok(Some(file)) => {
                match file.staleness(embedder.model_id(), embedder.dimensions(), &normalized, &hash) {
                    None => {
                        tracing::debug!(role = %role, records = file.records.len(), "Embedding index is fresh");
                        return Ok(file.records.into_iter().map(|r| r.vector).collect());
                    }
                    Some(reason) => {
                        tracing::warn!(role = %role, reason = %reason, "Embedding index is stale, recomputing");
                    }
                }
            }
            Ok(None) => {
                tracing::info!(role = %role, "No embedding index found, computing");
            }
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "Embedding index is unreadable, recomputing");
            }
        }

        let start = std::time::Instant::now();
        let vectors = embedder.embed_batch(&normalized)?;
        if vectors.len() != normalized.len() {
            return Err(MapperError::embedding(format!(
                "Embedder returned {} vectors for {} texts",
                vectors.len(),
                normalized.len()
            )));
        }
        tracing::info!(
            role = %role,
            count = vectors.len(),
            "Computed embeddings in {:?}",
            start.elapsed()
        );

        let file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            model_id: embedder.model_id().to_string(),
            content_hash: hash,
            created_at: Utc::now(),
            records: normalized
                .into_iter()
                .zip(vectors.iter().cloned())
                .map(|(text, vector)| IndexRecord { text, vector })
                .collect(),
        };
        if let Err(e) = self.write(role, &file) {
            tracing::warn!(role = %role, error = %e, "Failed to save embedding index");
        }

        Ok(vectors)
    }

    /// Report whether the file for `role` can serve `texts` as embedded by
    /// `model_id` with vectors of `dimensions` floats.
    pub fn status(
        &self,
        model_id: &str,
        dimensions: usize,
        role: EmbeddingRole,
        texts: &[String],
    ) -> IndexStatus {
        let file = match self.read(role) {
            Ok(Some(file)) => file,
            Ok(None) => return IndexStatus::Missing,
            Err(e) => {
                return IndexStatus::Corrupt {
                    reason: e.to_string(),
                };
            }
        };

        let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();
        let hash = texts_hash(model_id, &normalized);
        match file.staleness(model_id, dimensions, &normalized, &hash) {
            None => IndexStatus::Fresh {
                records: file.records.len(),
                created_at: file.created_at,
            },
            Some(reason) => IndexStatus::Stale { reason },
        }
    }

    /// Delete the files of every role, returning how many were removed.
    pub fn clear(&self) -> MapperResult<usize> {
        let mut removed = 0;
        for role in EmbeddingRole::ALL {
            match std::fs::remove_file(self.path(role)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}
