//! Configuration management for lessonmap.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Command-line flags (preset, focus, top-k)
//! 2. Config file (`$LESSONMAP_CONFIG` or the platform data dir `config.toml`)
//! 3. Default values

use anyhow::{Context, Result};
use directories::ProjectDirs;
use lessonmap_sdk::{EmbeddingBackend, EmbeddingConfig, MapperConfig, MatcherConfig, MatcherPreset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Matcher thresholds
    #[serde(default)]
    pub matcher: MatcherSection,

    /// Embedding backend
    #[serde(default)]
    pub embedding: EmbeddingSection,

    /// Course memory
    #[serde(default)]
    pub memory: MemorySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for lessonmap data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Taxonomy JSON file
    #[serde(default = "default_taxonomy")]
    pub taxonomy: PathBuf,

    /// Course memory file (default: `<data_dir>/course_memory.json`)
    pub memory: Option<PathBuf>,

    /// Embedding index directory (default: `<data_dir>/embeddings`)
    pub embeddings_dir: Option<PathBuf>,
}

/// `[matcher]` table: a preset plus optional per-field overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatcherSection {
    #[serde(default)]
    pub preset: MatcherPreset,

    pub top_k: Option<usize>,
    pub subject_threshold: Option<f32>,
    pub topic_threshold: Option<f32>,
    pub fallback_threshold: Option<f32>,
    pub chunk_max_words: Option<usize>,
    pub chunk_overlap: Option<f32>,
    pub high_confidence: Option<f32>,
    pub exclusion_patterns: Option<Vec<String>>,
    pub lesson_prefix: Option<String>,

    /// Also offer subject names in the fallback tier
    #[serde(default)]
    pub subjects_in_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSection {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_hashing_dimensions")]
    pub hashing_dimensions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySection {
    /// Course id given to a flat single-course memory file
    #[serde(default = "default_legacy_course_id")]
    pub legacy_course_id: String,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "lessonmap", "lessonmap") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lessonmap")
    }
}

fn default_taxonomy() -> PathBuf {
    PathBuf::from("data/taxonomy.json")
}

fn default_model() -> String {
    lessonmap_sdk::DEFAULT_MODEL.to_string()
}

fn default_batch_size() -> usize {
    EmbeddingConfig::default().batch_size
}

fn default_hashing_dimensions() -> usize {
    EmbeddingConfig::default().hashing_dimensions
}

fn default_legacy_course_id() -> String {
    lessonmap_sdk::memory::DEFAULT_LEGACY_COURSE_ID.to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            taxonomy: default_taxonomy(),
            memory: None,
            embeddings_dir: None,
        }
    }
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: default_model(),
            batch_size: default_batch_size(),
            hashing_dimensions: default_hashing_dimensions(),
        }
    }
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            legacy_course_id: default_legacy_course_id(),
        }
    }
}

impl PathsConfig {
    pub fn memory_path(&self) -> PathBuf {
        self.memory
            .clone()
            .unwrap_or_else(|| self.data_dir.join("course_memory.json"))
    }

    pub fn embeddings_dir(&self) -> PathBuf {
        self.embeddings_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("embeddings"))
    }
}

impl MatcherSection {
    /// Resolve the preset and apply every explicit override on top of it
    pub fn resolve(&self, preset: MatcherPreset) -> MatcherConfig {
        let mut config = MatcherConfig::preset(preset);

        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(value) = self.subject_threshold {
            config.subject_threshold = value;
        }
        if let Some(value) = self.topic_threshold {
            config.topic_threshold = value;
        }
        if let Some(value) = self.fallback_threshold {
            config.fallback_threshold = value;
        }
        if let Some(value) = self.chunk_max_words {
            config.chunk_max_words = value;
        }
        if let Some(value) = self.chunk_overlap {
            config.chunk_overlap = value;
        }
        if let Some(value) = self.high_confidence {
            config.high_confidence = value;
        }
        if let Some(patterns) = &self.exclusion_patterns {
            config.exclusion_patterns = patterns.clone();
        }
        if let Some(prefix) = &self.lesson_prefix {
            config.lesson_prefix_pattern = (!prefix.is_empty()).then(|| prefix.clone());
        }

        config
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, defaulting when it is absent.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        Ok(config)
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LESSONMAP_CONFIG") {
            PathBuf::from(path)
        } else {
            default_data_dir().join("config.toml")
        }
    }

    /// Build the SDK configuration, optionally replacing the configured preset.
    pub fn mapper_config(&self, preset: Option<MatcherPreset>) -> MapperConfig {
        let matcher = self.matcher.resolve(preset.unwrap_or(self.matcher.preset));

        let mut config = MapperConfig::new(&self.paths.taxonomy, self.paths.memory_path())
            .with_matcher(matcher)
            .with_embedding(EmbeddingConfig {
                backend: self.embedding.backend,
                model: self.embedding.model.clone(),
                batch_size: self.embedding.batch_size,
                hashing_dimensions: self.embedding.hashing_dimensions,
                cache_dir: self.paths.embeddings_dir(),
            });
        config.legacy_course_id = self.memory.legacy_course_id.clone();
        config.subjects_in_fallback = self.matcher.subjects_in_fallback;
        config
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.data_dir).context("Failed to create data directory")?;
        std::fs::create_dir_all(self.paths.embeddings_dir())
            .context("Failed to create embeddings directory")?;
        Ok(())
    }
}
