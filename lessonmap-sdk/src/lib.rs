//! lessonmap SDK - Lesson title to taxonomy mapping
//!
//! This crate provides the matching engine and the run controller on top
//! of `lessonmap-core`. All functionality is accessible through this single
//! crate, including:
//!
//! # Core Modules (from lessonmap-core)
//!
//! - **taxonomy** - Subject → topic hierarchy and flattened fallback list
//! - **memory** - Multi-course persistent title → topics memory
//! - **text** - Normalization and word-window chunking
//! - **types** - Candidates, lesson records and task records
//!
//! # SDK Modules
//!
//! - **embeddings** - Embedding port, fastembed and hashing backends, on-disk index
//! - **matcher** - Hierarchical subject → topic → fallback resolution
//! - **pipeline** - Run controller with memory reuse and human overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use lessonmap_sdk::{Mapper, MapperConfig, MatcherConfig, MatcherPreset};
//! use lessonmap_sdk::types::MatchMode;
//!
//! fn example() -> anyhow::Result<()> {
//!     let config = MapperConfig::new("data/taxonomy.json", "course_memory.json")
//!         .with_matcher(MatcherConfig::preset(MatcherPreset::Relaxed));
//!     let mut mapper = Mapper::new(config)?;
//!
//!     let titles = vec!["Aula 01: Crimes Contra a Vida".to_string()];
//!     for record in mapper.match_titles(&titles, &MatchMode::Automatic)? {
//!         println!("{} -> {:?}", record.title, record.topics());
//!     }
//!     Ok(())
//! }
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Re-export core modules from lessonmap-core
// ─────────────────────────────────────────────────────────────────────────────

/// Subject → topic hierarchy
pub use lessonmap_core::taxonomy;

/// Multi-course persistent memory
pub use lessonmap_core::memory;

/// Normalization and chunking
pub use lessonmap_core::text;

/// Core types (LessonRecord, MatchCandidate, TaskRecord, etc.)
pub use lessonmap_core::types;

/// Error types from core
pub use lessonmap_core::error as core_error;

// ─────────────────────────────────────────────────────────────────────────────
// SDK-specific modules
// ─────────────────────────────────────────────────────────────────────────────

pub mod embeddings;
pub mod matcher;
pub mod pipeline;
pub mod utils;

mod config;
mod error;
mod mapper;

// Re-export main SDK types
pub use config::{
    ConfigValidationError, DEFAULT_EXCLUSION_PATTERNS, DEFAULT_LESSON_PREFIX, DEFAULT_MODEL,
    EmbeddingBackend, EmbeddingConfig, MapperConfig, MatcherConfig, MatcherPreset,
};
pub use error::{MapperError, MapperResult};
pub use mapper::Mapper;

pub use embeddings::{Embedder, EmbeddingIndex, EmbeddingRole, FastEmbedder, HashingEmbedder, IndexStatus};
pub use matcher::Matcher;
pub use pipeline::{ReviewHook, RunController, RunOutcome, RunState, RunSummary, TitleSource};
