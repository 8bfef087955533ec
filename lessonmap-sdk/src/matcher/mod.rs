//! Hierarchical semantic matcher.
//!
//! Resolves each lesson title against the taxonomy in tiers:
//!
//! 1. Titles matching an exclusion pattern get no candidates.
//! 2. The normalized title loses its lesson-number prefix and is split into
//!    overlapping word windows when it is long.
//! 3. Per window, the closest subject is picked; if it clears the subject
//!    threshold, its topics are ranked against the topic threshold.
//! 4. When no subject qualifies or none of its topics do, the whole
//!    fallback list is ranked against the fallback threshold.
//!
//! In focused mode the topics of the designated subjects are pooled and
//! ranked first; an empty result falls back to the automatic tiers.
//! Candidates from every window are merged with [`ranking::dedupe`].

mod exclusion;
pub mod ranking;

use std::collections::BTreeSet;
use std::ops::Range;

use lessonmap_core::text::{chunk_words, normalize};
use lessonmap_core::{LessonRecord, MatchCandidate, MatchMode, Origin, Taxonomy};

pub use exclusion::TitleFilter;

use crate::config::MatcherConfig;
use crate::embeddings::{Embedder, EmbeddingIndex, EmbeddingRole, IndexStatus, similarity};
use crate::MapperResult;

/// Taxonomy vectors, aligned with the taxonomy's own ordering
#[derive(Debug, Default)]
struct TaxonomyVectors {
    subjects: Vec<Vec<f32>>,
    /// Topics of every subject, subject after subject
    topics: Vec<Vec<f32>>,
    /// Slice of `topics` owned by each subject
    topic_ranges: Vec<Range<usize>>,
    fallback: Vec<Vec<f32>>,
}

/// Mode with subject names resolved to taxonomy positions
enum Resolution {
    Automatic,
    Focused(Vec<usize>),
}

/// Matches lesson titles onto a taxonomy
pub struct Matcher {
    taxonomy: Taxonomy,
    config: MatcherConfig,
    filter: TitleFilter,
    embedder: Box<dyn Embedder>,
    index: EmbeddingIndex,
    vectors: Option<TaxonomyVectors>,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("model", &self.embedder.model_id())
            .field("subjects", &self.taxonomy.subjects().len())
            .field("index_ready", &self.vectors.is_some())
            .finish()
    }
}

impl Matcher {
    /// Create a matcher.
    ///
    /// Taxonomy vectors are loaded or computed on first use, see
    /// [`Matcher::ensure_index`].
    pub fn new(
        taxonomy: Taxonomy,
        config: MatcherConfig,
        embedder: Box<dyn Embedder>,
        index: EmbeddingIndex,
    ) -> MapperResult<Self> {
        config.validate()?;
        let filter = TitleFilter::from_config(&config)?;

        Ok(Self {
            taxonomy,
            config,
            filter,
            embedder,
            index,
            vectors: None,
        })
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Taxonomy texts embedded for `role`, in index order
    pub fn role_texts(&self, role: EmbeddingRole) -> Vec<String> {
        match role {
            EmbeddingRole::Subjects => self.taxonomy.subjects().iter().map(|s| s.name.clone()).collect(),
            EmbeddingRole::Topics => self
                .taxonomy
                .subjects()
                .iter()
                .flat_map(|s| s.topics.iter().cloned())
                .collect(),
            EmbeddingRole::Fallback => self.taxonomy.fallback().to_vec(),
        }
    }

    /// Load or compute the taxonomy vectors if not done yet.
    ///
    /// Any error here (model load, embedding failure) is fatal for the run.
    pub fn ensure_index(&mut self) -> MapperResult<()> {
        if self.vectors.is_some() {
            return Ok(());
        }

        let subjects = self.role_texts(EmbeddingRole::Subjects);
        let topics = self.role_texts(EmbeddingRole::Topics);
        let fallback = self.role_texts(EmbeddingRole::Fallback);

        let embedder = self.embedder.as_mut();
        let subject_vectors = self.index.get_or_compute(embedder, EmbeddingRole::Subjects, &subjects)?;
        let topic_vectors = self.index.get_or_compute(embedder, EmbeddingRole::Topics, &topics)?;
        let fallback_vectors = self.index.get_or_compute(embedder, EmbeddingRole::Fallback, &fallback)?;

        let mut topic_ranges = Vec::with_capacity(self.taxonomy.subjects().len());
        let mut start = 0;
        for subject in self.taxonomy.subjects() {
            topic_ranges.push(start..start + subject.topics.len());
            start += subject.topics.len();
        }

        tracing::info!(
            subjects = subject_vectors.len(),
            topics = topic_vectors.len(),
            fallback = fallback_vectors.len(),
            "Embedding index ready"
        );

        self.vectors = Some(TaxonomyVectors {
            subjects: subject_vectors,
            topics: topic_vectors,
            topic_ranges,
            fallback: fallback_vectors,
        });
        Ok(())
    }

    /// Drop every index file and recompute the vectors.
    pub fn rebuild_index(&mut self) -> MapperResult<()> {
        let removed = self.index.clear()?;
        tracing::info!(removed, dir = %self.index.dir().display(), "Cleared embedding index");
        self.vectors = None;
        self.ensure_index()
    }

    /// Freshness of each role file for the current taxonomy and model
    pub fn index_status(&self) -> Vec<(EmbeddingRole, IndexStatus)> {
        EmbeddingRole::ALL
            .into_iter()
            .map(|role| {
                let status = self.index.status(
                    self.embedder.model_id(),
                    self.embedder.dimensions(),
                    role,
                    &self.role_texts(role),
                );
                (role, status)
            })
            .collect()
    }

    fn resolve_mode(&self, mode: &MatchMode) -> Resolution {
        match mode {
            MatchMode::Automatic => Resolution::Automatic,
            MatchMode::Focused(names) => {
                for name in names {
                    if self.taxonomy.subject_index(name).is_none() {
                        tracing::warn!(subject = %name, "Unknown subject in focus list, ignoring it");
                    }
                }
                let wanted: BTreeSet<usize> = names
                    .iter()
                    .filter_map(|name| self.taxonomy.subject_index(name))
                    .collect();
                Resolution::Focused(wanted.into_iter().collect())
            }
        }
    }

    /// Match a batch of titles.
    ///
    /// Failing to build the index aborts the batch. A failure on a single
    /// title leaves that title unmapped with the error recorded and the
    /// batch goes on.
    pub fn match_titles(&mut self, titles: &[String], mode: &MatchMode) -> MapperResult<Vec<LessonRecord>> {
        self.ensure_index()?;
        let resolution = self.resolve_mode(mode);

        let records: Vec<LessonRecord> = titles
            .iter()
            .map(|title| match self.match_resolved(title, &resolution) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(title = %title, error = %e, "Failed to match title");
                    LessonRecord::failed(title.as_str(), normalize(title), e.to_string())
                }
            })
            .collect();

        let mapped = records.iter().filter(|r| r.mapped).count();
        tracing::info!(total = records.len(), mapped, "Matching finished");
        Ok(records)
    }

    /// Match a single title
    pub fn match_title(&mut self, title: &str, mode: &MatchMode) -> MapperResult<LessonRecord> {
        self.ensure_index()?;
        let resolution = self.resolve_mode(mode);
        self.match_resolved(title, &resolution)
    }

    fn match_resolved(&mut self, title: &str, resolution: &Resolution) -> MapperResult<LessonRecord> {
        let normalized = normalize(title);

        if let Some(pattern) = self.filter.exclusion(&normalized) {
            tracing::debug!(title = %title, pattern = %pattern, "Title excluded from matching");
            return Ok(LessonRecord::new(title, normalized, Vec::new()));
        }

        let query = self.filter.strip_prefix(&normalized).into_owned();
        let chunks = chunk_words(&query, self.config.chunk_max_words, self.config.chunk_overlap);
        if chunks.is_empty() {
            return Ok(LessonRecord::new(title, normalized, Vec::new()));
        }

        let chunk_vectors = self.embedder.embed_batch(&chunks)?;
        let Some(vectors) = self.vectors.as_ref() else {
            return Err(crate::MapperError::invalid_operation("Embedding index not built"));
        };

        let mut found = Vec::new();
        for (chunk, vector) in chunks.iter().zip(&chunk_vectors) {
            let candidates = self.resolve_chunk(vectors, vector, resolution);
            tracing::debug!(title = %title, chunk = %chunk, candidates = candidates.len(), "Chunk resolved");
            found.extend(candidates);
        }

        Ok(LessonRecord::new(title, normalized, ranking::dedupe(found)))
    }

    fn resolve_chunk(&self, vectors: &TaxonomyVectors, query: &[f32], resolution: &Resolution) -> Vec<MatchCandidate> {
        if let Resolution::Focused(subjects) = resolution {
            let focused = self.resolve_focused(vectors, query, subjects);
            if !focused.is_empty() {
                return focused;
            }
            tracing::debug!("No topic of the focused subjects qualified, using automatic resolution");
        }
        self.resolve_automatic(vectors, query)
    }

    fn resolve_automatic(&self, vectors: &TaxonomyVectors, query: &[f32]) -> Vec<MatchCandidate> {
        let subject_scores: Vec<f32> = vectors.subjects.iter().map(|v| similarity(query, v)).collect();

        match ranking::argmax(&subject_scores) {
            Some((idx, score)) if score >= self.config.subject_threshold => {
                let range = vectors.topic_ranges[idx].clone();
                let topic_scores: Vec<f32> = vectors.topics[range]
                    .iter()
                    .map(|v| similarity(query, v))
                    .collect();
                let subject = &self.taxonomy.subjects()[idx];

                let hits: Vec<MatchCandidate> =
                    ranking::top_k(&topic_scores, self.config.top_k, self.config.topic_threshold)
                        .into_iter()
                        .map(|(i, s)| MatchCandidate::new(subject.topics[i].clone(), s, Origin::Hierarchical))
                        .collect();
                if !hits.is_empty() {
                    return hits;
                }
                tracing::debug!(subject = %subject.name, score, "Subject found but no topic qualified");
            }
            Some((_, score)) => {
                tracing::debug!(score, "No subject above threshold");
            }
            None => {}
        }

        let fallback_scores: Vec<f32> = vectors.fallback.iter().map(|v| similarity(query, v)).collect();
        ranking::top_k(&fallback_scores, self.config.top_k, self.config.fallback_threshold)
            .into_iter()
            .map(|(i, s)| MatchCandidate::new(self.taxonomy.fallback()[i].clone(), s, Origin::Fallback))
            .collect()
    }

    fn resolve_focused(&self, vectors: &TaxonomyVectors, query: &[f32], subjects: &[usize]) -> Vec<MatchCandidate> {
        let mut terms: Vec<&str> = Vec::new();
        let mut scores: Vec<f32> = Vec::new();
        for &idx in subjects {
            let subject = &self.taxonomy.subjects()[idx];
            let range = vectors.topic_ranges[idx].clone();
            for (topic, vector) in subject.topics.iter().zip(&vectors.topics[range]) {
                terms.push(topic);
                scores.push(similarity(query, vector));
            }
        }

        ranking::top_k(&scores, self.config.top_k, self.config.topic_threshold)
            .into_iter()
            .map(|(i, s)| MatchCandidate::new(terms[i], s, Origin::Hierarchical))
            .collect()
    }
}
