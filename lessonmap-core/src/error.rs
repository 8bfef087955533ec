//! Error types for lessonmap-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using lessonmap-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for lessonmap operations
#[derive(Error, Debug)]
pub enum Error {
    // Taxonomy errors
    #[error("Taxonomy file not found: {}", .0.display())]
    TaxonomyNotFound(PathBuf),

    #[error("Invalid taxonomy file {}: {message}", path.display())]
    InvalidTaxonomy { path: PathBuf, message: String },

    // Memory errors
    #[error("No course selected. Call select_course() before reading or writing memory.")]
    NoActiveCourse,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid taxonomy error
    pub fn invalid_taxonomy(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidTaxonomy {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error means no course was selected
    pub fn is_no_active_course(&self) -> bool {
        matches!(self, Self::NoActiveCourse)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::TaxonomyNotFound(PathBuf::from("data/taxonomy.json"));
        assert!(err.to_string().contains("data/taxonomy.json"));

        let err = Error::invalid_taxonomy("t.json", "expected array");
        assert!(err.to_string().contains("t.json"));
        assert!(err.to_string().contains("expected array"));

        assert!(Error::NoActiveCourse.is_no_active_course());
        assert!(!Error::Other("x".into()).is_no_active_course());
    }
}
