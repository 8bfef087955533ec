//! Mapper Error Types
//!
//! Defines error types for the lessonmap SDK.

use thiserror::Error;

/// Mapper Result type alias
pub type MapperResult<T> = Result<T, MapperError>;

/// Mapper errors
#[derive(Debug, Error)]
pub enum MapperError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigValidationError),

    /// Taxonomy or memory error
    #[error(transparent)]
    Core(#[from] lessonmap_core::Error),

    /// Embedding model error
    #[error("embedding error: {message}")]
    Embedding { message: String },

    /// Embedding index error
    #[error("index error: {message}")]
    Index { message: String },

    /// Run controller error
    #[error("pipeline error: {message}")]
    Pipeline { message: String },

    /// Invalid operation
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Collaborator error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl MapperError {
    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    /// Create a pipeline error
    pub fn pipeline(message: impl Into<String>) -> Self {
        Self::Pipeline {
            message: message.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Check if this error came from the embedding model
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding { .. })
    }

    /// Check if this error means no course was selected
    pub fn is_no_active_course(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_no_active_course())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MapperError::embedding("model missing");
        assert!(err.is_embedding());
        assert!(err.to_string().contains("model missing"));

        let err = MapperError::index("truncated file");
        assert!(err.to_string().starts_with("index error"));

        let err = MapperError::pipeline("no lessons");
        assert!(err.to_string().contains("no lessons"));

        let err: MapperError = lessonmap_core::Error::NoActiveCourse.into();
        assert!(err.is_no_active_course());
        assert!(!MapperError::invalid_operation("x").is_no_active_course());
    }
}
