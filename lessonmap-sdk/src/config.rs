//! Mapper Configuration
//!
//! Defines configuration options for the matcher, the embedding backend and
//! the file locations used by a run.

use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default sentence-embedding model
pub const DEFAULT_MODEL: &str = "paraphrase-multilingual-MiniLM-L12-v2";

/// Non-content lessons: course introduction, general reviews, X-ray
/// sessions and PDF-only wrap-ups. Matched against normalized titles.
pub const DEFAULT_EXCLUSION_PATTERNS: &[&str] = &[
    r"\bapresentacao do curso\b",
    r"\b(revisao|resumo) (geral|final)\b",
    r"\braio x\b",
    r"\b(somente|apenas) (em )?pdf\b",
];

/// Leading lesson number ("Aula 01:", "Aula 10 -") in normalized form
pub const DEFAULT_LESSON_PREFIX: &str = r"^aula \d+\s*";

/// Named bundle of thresholds and top-K
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherPreset {
    /// Production thresholds
    #[default]
    Automatic,
    /// Permissive thresholds for titles without an explicit subject
    Relaxed,
    /// Thresholds used when the user designates the subjects
    Focused,
}

impl MatcherPreset {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Relaxed => "relaxed",
            Self::Focused => "focused",
        }
    }
}

impl std::fmt::Display for MatcherPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MatcherPreset {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(Self::Automatic),
            "relaxed" => Ok(Self::Relaxed),
            "focused" => Ok(Self::Focused),
            _ => Err(format!("Invalid preset: {}", s)),
        }
    }
}

/// Matcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Maximum candidates per tier and chunk (default: 2)
    pub top_k: usize,

    /// Minimum similarity for the best subject (default: 0.75)
    pub subject_threshold: f32,

    /// Minimum similarity for a topic inside the chosen subject (default: 0.80)
    pub topic_threshold: f32,

    /// Minimum similarity for a flat fallback hit (default: 0.82)
    pub fallback_threshold: f32,

    /// Titles longer than this are split into word windows (default: 12)
    pub chunk_max_words: usize,

    /// Fraction of words shared by consecutive windows (default: 0.25)
    pub chunk_overlap: f32,

    /// Scores at or above this are shown as high confidence (default: 0.85)
    pub high_confidence: f32,

    /// Regexes marking non-content lessons, matched on normalized titles
    pub exclusion_patterns: Vec<String>,

    /// Regex removed from the start of normalized titles before embedding
    pub lesson_prefix_pattern: Option<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self::preset(MatcherPreset::default())
    }
}

impl MatcherConfig {
    /// Configuration for a named preset
    pub fn preset(preset: MatcherPreset) -> Self {
        let (top_k, subject, topic, fallback) = match preset {
            MatcherPreset::Automatic => (2, 0.75, 0.80, 0.82),
            MatcherPreset::Relaxed | MatcherPreset::Focused => (3, 0.60, 0.65, 0.70),
        };

        Self {
            top_k,
            subject_threshold: subject,
            topic_threshold: topic,
            fallback_threshold: fallback,
            chunk_max_words: 12,
            chunk_overlap: 0.25,
            high_confidence: 0.85,
            exclusion_patterns: DEFAULT_EXCLUSION_PATTERNS.iter().map(|p| p.to_string()).collect(),
            lesson_prefix_pattern: Some(DEFAULT_LESSON_PREFIX.to_string()),
        }
    }

    /// Set top-K
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set all three thresholds
    pub fn with_thresholds(mut self, subject: f32, topic: f32, fallback: f32) -> Self {
        self.subject_threshold = subject;
        self.topic_threshold = topic;
        self.fallback_threshold = fallback;
        self
    }

    /// Set the chunking window
    pub fn with_chunking(mut self, max_words: usize, overlap: f32) -> Self {
        self.chunk_max_words = max_words;
        self.chunk_overlap = overlap;
        self
    }

    /// Replace the exclusion patterns
    pub fn with_exclusion_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusion_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set or clear the lesson-number prefix pattern
    pub fn with_lesson_prefix(mut self, pattern: Option<String>) -> Self {
        self.lesson_prefix_pattern = pattern;
        self
    }

    /// True when `score` falls in the high-confidence band
    pub fn is_high_confidence(&self, score: f32) -> bool {
        score >= self.high_confidence
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.top_k == 0 {
            return Err(ConfigValidationError::invalid("matcher.top_k", "must be greater than 0"));
        }

        for (field, value) in [
            ("matcher.subject_threshold", self.subject_threshold),
            ("matcher.topic_threshold", self.topic_threshold),
            ("matcher.fallback_threshold", self.fallback_threshold),
            ("matcher.high_confidence", self.high_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::invalid(field, "must be between 0 and 1"));
            }
        }

        if self.chunk_max_words < 2 {
            return Err(ConfigValidationError::invalid(
                "matcher.chunk_max_words",
                "must be at least 2",
            ));
        }

        if !(0.0..1.0).contains(&self.chunk_overlap) {
            return Err(ConfigValidationError::invalid(
                "matcher.chunk_overlap",
                "must be in [0, 1)",
            ));
        }

        for pattern in self.exclusion_patterns.iter().chain(self.lesson_prefix_pattern.iter()) {
            if let Err(e) = Regex::new(pattern) {
                return Err(ConfigValidationError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX sentence model
    #[default]
    FastEmbed,
    /// Deterministic feature hashing, no model download
    Hashing,
}

impl EmbeddingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FastEmbed => "fastembed",
            Self::Hashing => "hashing",
        }
    }
}

impl std::fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EmbeddingBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fastembed" => Ok(Self::FastEmbed),
            "hashing" => Ok(Self::Hashing),
            _ => Err(format!("Invalid embedding backend: {}", s)),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend producing the vectors (default: fastembed)
    pub backend: EmbeddingBackend,

    /// Model name for the fastembed backend
    pub model: String,

    /// Texts per model call (default: 64)
    pub batch_size: usize,

    /// Vector length for the hashing backend (default: 1024)
    pub hashing_dimensions: usize,

    /// Directory holding the per-role index files
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: DEFAULT_MODEL.to_string(),
            batch_size: 64,
            hashing_dimensions: 1024,
            cache_dir: PathBuf::from("cache/embeddings"),
        }
    }
}

/// Top-level configuration for a [`crate::Mapper`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Path to the taxonomy JSON file
    pub taxonomy_path: PathBuf,

    /// Path to the course memory file
    pub memory_path: PathBuf,

    /// Course id given to entries of a flat single-course memory file
    pub legacy_course_id: String,

    /// Append subject names to the fallback list (default: false)
    pub subjects_in_fallback: bool,

    /// Matcher configuration
    pub matcher: MatcherConfig,

    /// Embedding configuration
    pub embedding: EmbeddingConfig,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            taxonomy_path: PathBuf::from("data/taxonomy.json"),
            memory_path: PathBuf::from("course_memory.json"),
            legacy_course_id: lessonmap_core::memory::DEFAULT_LEGACY_COURSE_ID.to_string(),
            subjects_in_fallback: false,
            matcher: MatcherConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl MapperConfig {
    /// Create a config with the given taxonomy and memory paths
    pub fn new(taxonomy_path: impl Into<PathBuf>, memory_path: impl Into<PathBuf>) -> Self {
        Self {
            taxonomy_path: taxonomy_path.into(),
            memory_path: memory_path.into(),
            ..Default::default()
        }
    }

    /// Set the embeddings directory
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.embedding.cache_dir = cache_dir.into();
        self
    }

    /// Set matcher configuration
    pub fn with_matcher(mut self, matcher: MatcherConfig) -> Self {
        self.matcher = matcher;
        self
    }

    /// Set embedding configuration
    pub fn with_embedding(mut self, embedding: EmbeddingConfig) -> Self {
        self.embedding = embedding;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.taxonomy_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingPath("taxonomy_path"));
        }
        if self.memory_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingPath("memory_path"));
        }
        if self.legacy_course_id.trim().is_empty() {
            return Err(ConfigValidationError::invalid(
                "legacy_course_id",
                "must not be empty",
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigValidationError::invalid(
                "embedding.batch_size",
                "must be greater than 0",
            ));
        }
        if self.embedding.hashing_dimensions == 0 {
            return Err(ConfigValidationError::invalid(
                "embedding.hashing_dimensions",
                "must be greater than 0",
            ));
        }

        self.matcher.validate()
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("{0} is required")]
    MissingPath(&'static str),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl ConfigValidationError {
    fn invalid(field: &str, message: &str) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
