//! Main Mapper Entry Point
//!
//! Provides the main Mapper struct that ties together all components.

use lessonmap_core::memory::{CourseMemory, MemoryOptions};
use lessonmap_core::{LessonRecord, MatchMode, Taxonomy};

use crate::embeddings::{self, Embedder, EmbeddingIndex, EmbeddingRole, IndexStatus};
use crate::matcher::Matcher;
use crate::pipeline::{ReviewHook, RunController, RunOutcome, TitleSource};
use crate::{MapperConfig, MapperResult};

/// lessonmap - Main entry point
///
/// The Mapper owns:
/// - The taxonomy and the matcher built on it
/// - The embedding index
/// - The course memory
///
/// # Example
///
/// ```rust,no_run
/// use lessonmap_sdk::{MapperConfig, Mapper};
/// use lessonmap_sdk::pipeline::StaticTitles;
/// use lessonmap_core::MatchMode;
///
/// fn example() -> anyhow::Result<()> {
///     let mut mapper = Mapper::new(MapperConfig::new("data/taxonomy.json", "course_memory.json"))?;
///
///     let mut source = StaticTitles::new(["Aula 01: Crimes Contra a Vida"]);
///     let outcome = mapper.run("https://bo.example.com/curso?id=123", &mut source, None, MatchMode::Automatic)?;
///
///     for task in &outcome.tasks {
///         println!("{} -> {:?}", task.title, task.topics);
///     }
///     Ok(())
/// }
/// ```
pub struct Mapper {
    /// Mapper configuration
    config: MapperConfig,

    /// Matcher over the loaded taxonomy
    matcher: Matcher,

    /// Cross-run course memory
    memory: CourseMemory,
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("matcher", &self.matcher)
            .field("memory", &self.memory.path())
            .finish()
    }
}

impl Mapper {
    /// Create a new Mapper with the embedder selected by the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The taxonomy file is missing or malformed
    /// - The configured embedding model is unknown
    pub fn new(config: MapperConfig) -> MapperResult<Self> {
        config.validate()?;
        let embedder = embeddings::from_config(&config.embedding)?;
        Self::with_embedder(config, embedder)
    }

    /// Create a new Mapper with an explicit embedder
    pub fn with_embedder(config: MapperConfig, embedder: Box<dyn Embedder>) -> MapperResult<Self> {
        config.validate()?;

        let mut taxonomy = Taxonomy::load(&config.taxonomy_path)?;
        if config.subjects_in_fallback {
            taxonomy = taxonomy.with_subjects_in_fallback();
        }
        if taxonomy.is_empty() {
            tracing::warn!(path = %config.taxonomy_path.display(), "Taxonomy has no subjects");
        }

        let index = EmbeddingIndex::new(&config.embedding.cache_dir);
        let matcher = Matcher::new(taxonomy, config.matcher.clone(), embedder, index)?;

        let options = MemoryOptions {
            legacy_course_id: config.legacy_course_id.clone(),
        };
        let memory = CourseMemory::open_with(&config.memory_path, &options);

        Ok(Self {
            config,
            matcher,
            memory,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        self.matcher.taxonomy()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn memory(&self) -> &CourseMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut CourseMemory {
        &mut self.memory
    }

    /// Load the model and the taxonomy vectors up front
    pub fn prepare(&mut self) -> MapperResult<()> {
        self.matcher.ensure_index()
    }

    /// Recompute every index file
    pub fn rebuild_index(&mut self) -> MapperResult<()> {
        self.matcher.rebuild_index()
    }

    pub fn index_status(&self) -> Vec<(EmbeddingRole, IndexStatus)> {
        self.matcher.index_status()
    }

    /// Match titles without touching memory
    pub fn match_titles(&mut self, titles: &[String], mode: &MatchMode) -> MapperResult<Vec<LessonRecord>> {
        self.matcher.match_titles(titles, mode)
    }

    /// Run the full pipeline for one course
    pub fn run(
        &mut self,
        course: &str,
        source: &mut dyn TitleSource,
        review: Option<&mut dyn ReviewHook>,
        mode: MatchMode,
    ) -> MapperResult<RunOutcome> {
        RunController::new(&mut self.matcher, &mut self.memory)
            .with_mode(mode)
            .run(course, source, review)
    }
}
