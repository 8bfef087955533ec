//! Taxonomy loading.
//!
//! The taxonomy source is a JSON array of subjects, each with a list of
//! topics:
//!
//! ```json
//! [{"name": "Direito Penal", "topics": [{"name": "Crimes Contra a Vida"}]}]
//! ```
//!
//! The catalog export uses Portuguese keys (`nome` / `assuntos`); both
//! spellings are accepted. Entries without a name are skipped. Loading is
//! all-or-nothing: a missing or malformed file is an error and nothing is
//! kept.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::Subject;

#[derive(Debug, Deserialize)]
struct RawSubject {
    #[serde(default, alias = "nome")]
    name: Option<String>,
    #[serde(default, alias = "assuntos")]
    topics: Vec<RawTopic>,
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    #[serde(default, alias = "nome")]
    name: Option<String>,
}

/// Subject → topics hierarchy plus the flattened fallback list
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    subjects: Vec<Subject>,
    fallback: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl Taxonomy {
    /// Build a taxonomy from already-parsed subjects.
    ///
    /// Later subjects with a name already seen are merged into the first
    /// one so subject names stay unique.
    pub fn from_subjects(subjects: Vec<Subject>) -> Self {
        let mut merged: Vec<Subject> = Vec::with_capacity(subjects.len());
        let mut by_name = HashMap::new();

        for subject in subjects {
            match by_name.get(&subject.name) {
                Some(&idx) => {
                    let existing: &mut Subject = &mut merged[idx];
                    existing.topics.extend(subject.topics);
                }
                None => {
                    by_name.insert(subject.name.clone(), merged.len());
                    merged.push(subject);
                }
            }
        }

        let fallback = merged
            .iter()
            .flat_map(|s| s.topics.iter().cloned())
            .collect();

        Self {
            subjects: merged,
            fallback,
            by_name,
        }
    }

    /// Parse the JSON hierarchy document.
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self> {
        let raw: Vec<RawSubject> = serde_json::from_str(json)
            .map_err(|e| Error::invalid_taxonomy(origin, e.to_string()))?;

        let subjects = raw
            .into_iter()
            .filter_map(|s| {
                let name = s.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
                let topics = s
                    .topics
                    .into_iter()
                    .filter_map(|t| t.name.map(|n| n.trim().to_string()))
                    .filter(|n| !n.is_empty())
                    .collect();
                Some(Subject::new(name, topics))
            })
            .collect();

        Ok(Self::from_subjects(subjects))
    }

    /// Load the hierarchy from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::TaxonomyNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let taxonomy = Self::from_json_str(&content, path)?;
        tracing::info!(
            path = %path.display(),
            subjects = taxonomy.subjects.len(),
            topics = taxonomy.fallback.len(),
            "Taxonomy loaded"
        );
        Ok(taxonomy)
    }

    /// Append every subject name to the fallback list.
    pub fn with_subjects_in_fallback(mut self) -> Self {
        let names: Vec<String> = self.subjects.iter().map(|s| s.name.clone()).collect();
        self.fallback.extend(names);
        self
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject_names(&self) -> Vec<&str> {
        self.subjects.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.by_name.get(name).map(|&idx| &self.subjects[idx])
    }

    /// Position of a subject in [`Taxonomy::subjects`]
    pub fn subject_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Flattened topic list used for flat search
    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    pub fn topic_count(&self) -> usize {
        self.subjects.iter().map(|s| s.topics.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}
