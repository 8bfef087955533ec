//! lessonmap-core - Core library for lessonmap
//!
//! This crate provides the model-free building blocks shared by the SDK and
//! the CLI:
//!
//! - **types**: subjects, match candidates, lesson and task records
//! - **text**: normalization and overlapping word-window chunking
//! - **taxonomy**: subject → topic hierarchy and the flattened fallback list
//! - **memory**: multi-course persistent title → topics memory

pub mod error;
pub mod memory;
pub mod taxonomy;
pub mod text;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use memory::CourseMemory;
pub use taxonomy::Taxonomy;
pub use types::{LessonRecord, MatchCandidate, MatchMode, Origin, Subject, TaskRecord};
