//! Shared types for lessonmap-core.
//!
//! These types flow from the matcher through the course memory to the
//! downstream filter tooling.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Taxonomy Types
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level taxonomy category and its ordered topics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub topics: Vec<String>,
}

impl Subject {
    pub fn new(name: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            name: name.into(),
            topics,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Match Types
// ─────────────────────────────────────────────────────────────────────────────

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Subject resolved first, then a topic inside it
    Hierarchical,
    /// Flat search over the whole fallback list
    Fallback,
    /// Reused from course memory
    Cache,
    /// Supplied by human review
    Manual,
}

impl Origin {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hierarchical => "hierarchical",
            Self::Fallback => "fallback",
            Self::Cache => "cache",
            Self::Manual => "manual",
        }
    }

    /// True for candidates produced by the embedding model
    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Hierarchical | Self::Fallback)
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Origin {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hierarchical" => Ok(Origin::Hierarchical),
            "fallback" => Ok(Origin::Fallback),
            "cache" => Ok(Origin::Cache),
            "manual" => Ok(Origin::Manual),
            _ => Err(format!("Invalid origin: {}", s)),
        }
    }
}

/// A proposed topic with its similarity score and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub term: String,
    /// Similarity in [0, 1]
    pub score: f32,
    pub origin: Origin,
}

impl MatchCandidate {
    pub fn new(term: impl Into<String>, score: f32, origin: Origin) -> Self {
        Self {
            term: term.into(),
            score: score.clamp(0.0, 1.0),
            origin,
        }
    }

    /// Candidate taken verbatim from memory
    pub fn cached(term: impl Into<String>) -> Self {
        Self::new(term, 1.0, Origin::Cache)
    }

    /// Candidate supplied by a reviewer
    pub fn manual(term: impl Into<String>) -> Self {
        Self::new(term, 1.0, Origin::Manual)
    }
}

/// How titles are resolved against the taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Subject first, then topics, then flat fallback
    #[default]
    Automatic,
    /// Rank only the topics of the designated subjects
    Focused(BTreeSet<String>),
}

impl MatchMode {
    pub fn focused<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Focused(subjects.into_iter().map(Into::into).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Record Types
// ─────────────────────────────────────────────────────────────────────────────

/// Matching result for one lesson title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
    pub title: String,
    pub normalized_title: String,
    pub candidates: Vec<MatchCandidate>,
    pub mapped: bool,
    /// Why the title was left unmapped after a failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LessonRecord {
    pub fn new(
        title: impl Into<String>,
        normalized_title: impl Into<String>,
        candidates: Vec<MatchCandidate>,
    ) -> Self {
        let mapped = !candidates.is_empty();
        Self {
            title: title.into(),
            normalized_title: normalized_title.into(),
            candidates,
            mapped,
            error: None,
        }
    }

    /// Unmapped record carrying the failure reason
    pub fn failed(
        title: impl Into<String>,
        normalized_title: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(title, normalized_title, Vec::new())
        }
    }

    /// Replace the candidate set, keeping `mapped` consistent
    pub fn set_candidates(&mut self, candidates: Vec<MatchCandidate>) {
        self.mapped = !candidates.is_empty();
        self.candidates = candidates;
    }

    /// Topic terms in candidate order
    pub fn topics(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.term.clone()).collect()
    }

    /// Origin shared by every candidate, if any
    pub fn origin(&self) -> Option<Origin> {
        let first = self.candidates.first()?.origin;
        self.candidates
            .iter()
            .all(|c| c.origin == first)
            .then_some(first)
    }

    pub fn to_task(&self) -> TaskRecord {
        TaskRecord::new(self.title.clone(), self.topics())
    }
}

/// Record handed to the downstream filter collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub title: String,
    pub topics: Vec<String>,
    pub mapped: bool,
}

impl TaskRecord {
    pub fn new(title: impl Into<String>, topics: Vec<String>) -> Self {
        let mapped = !topics.is_empty();
        Self {
            title: title.into(),
            topics,
            mapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_score_is_clamped() {
        assert_eq!(MatchCandidate::new("a", 1.4, Origin::Fallback).score, 1.0);
        assert_eq!(MatchCandidate::new("a", -0.2, Origin::Fallback).score, 0.0);
        assert_eq!(MatchCandidate::cached("a").origin, Origin::Cache);
        assert_eq!(MatchCandidate::manual("a").score, 1.0);
    }

    #[test]
    fn test_lesson_record_mapped_follows_candidates() {
        let mut record = LessonRecord::new("Aula 1", "aula 1", Vec::new());
        assert!(!record.mapped);

        record.set_candidates(vec![MatchCandidate::new("X", 0.9, Origin::Hierarchical)]);
        assert!(record.mapped);
        assert_eq!(record.topics(), vec!["X".to_string()]);
        assert_eq!(record.origin(), Some(Origin::Hierarchical));

        record.set_candidates(Vec::new());
        assert!(!record.mapped);
        assert_eq!(record.origin(), None);
    }

    #[test]
    fn test_failed_record() {
        let record = LessonRecord::failed("Aula 1", "aula 1", "encode failed");
        assert!(!record.mapped);
        assert_eq!(record.error.as_deref(), Some("encode failed"));
    }

    #[test]
    fn test_mixed_origin() {
        let record = LessonRecord::new(
            "t",
            "t",
            vec![
                MatchCandidate::new("a", 0.9, Origin::Hierarchical),
                MatchCandidate::new("b", 0.8, Origin::Fallback),
            ],
        );
        assert_eq!(record.origin(), None);
    }

    #[test]
    fn test_task_record_json_shape() {
        let task = TaskRecord::new("Aula 1", vec!["X".into()]);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["title"], "Aula 1");
        assert_eq!(json["topics"][0], "X");
        assert_eq!(json["mapped"], true);
    }

    #[test]
    fn test_origin_roundtrip() {
        for origin in [Origin::Hierarchical, Origin::Fallback, Origin::Cache, Origin::Manual] {
            assert_eq!(origin.as_str().parse::<Origin>().unwrap(), origin);
        }
        assert!("bogus".parse::<Origin>().is_err());
        assert!(Origin::Fallback.is_ai());
        assert!(!Origin::Manual.is_ai());
    }
}
