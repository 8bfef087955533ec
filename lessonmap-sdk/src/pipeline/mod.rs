//! Run controller.
//!
//! One run takes a course from lesson titles to stored topic lists:
//!
//! ```text
//! Init → CheckMemory → ReuseMemory ──────┐
//!                    → FreshExtraction ──┴→ Match → MergeWithOverrides → Persist → Done
//! ```
//!
//! Any unrecoverable error moves the run to `Failed`. When the course is
//! the one last worked on and memory already holds its lessons, the title
//! source is not consulted at all: the run replays the recorded lesson
//! order and matches only titles without stored topics, so lessons that
//! failed last time are retried. Titles already in memory are never
//! re-matched, and review overrides always win over the matcher.

mod collaborators;

use chrono::{DateTime, Utc};
use lessonmap_core::text::normalize;
use lessonmap_core::{CourseMemory, LessonRecord, MatchCandidate, MatchMode, TaskRecord};
use serde::Serialize;
use uuid::Uuid;

pub use collaborators::{FixedOverrides, Overrides, ReviewHook, StaticTitles, TitleSource};

use crate::matcher::Matcher;
use crate::{MapperError, MapperResult};

/// Stages of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    CheckMemory,
    ReuseMemory,
    FreshExtraction,
    Match,
    MergeWithOverrides,
    Persist,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::CheckMemory => "check_memory",
            Self::ReuseMemory => "reuse_memory",
            Self::FreshExtraction => "fresh_extraction",
            Self::Match => "match",
            Self::MergeWithOverrides => "merge_with_overrides",
            Self::Persist => "persist",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a record's final topics came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provenance {
    Cache,
    Matched,
    Override,
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub from_cache: usize,
    pub matched: usize,
    pub overridden: usize,
    pub failed: usize,
}

/// Result of a finished run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub course_id: String,
    /// True when the title source was skipped in favour of memory
    pub reused_memory: bool,
    /// States visited, in order
    pub states: Vec<RunState>,
    pub records: Vec<LessonRecord>,
    /// Downstream `{title, topics, mapped}` view of `records`
    pub tasks: Vec<TaskRecord>,
    /// False when memory was unchanged or the write failed
    pub persisted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: RunSummary,
}

impl RunOutcome {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Extract a course id from a bare id or a URL with an `id=` parameter.
///
/// ```
/// use lessonmap_sdk::pipeline::parse_course_id;
///
/// assert_eq!(parse_course_id("https://bo.example.com/curso?id=123456"), Some("123456".to_string()));
/// assert_eq!(parse_course_id(" 123456 "), Some("123456".to_string()));
/// assert_eq!(parse_course_id("https://bo.example.com/curso"), None);
/// ```
pub fn parse_course_id(input: &str) -> Option<String> {
    let input = input.trim();

    let id = match input.split_once('?') {
        Some((_, query)) => query_param(query, "id")?,
        None if input.contains('/') => return None,
        None => input.strip_prefix("id=").unwrap_or(input),
    };

    (!id.is_empty() && !id.contains(char::is_whitespace)).then(|| id.to_string())
}

/// Value of the query parameter named exactly `key`
fn query_param<'q>(query: &'q str, key: &str) -> Option<&'q str> {
    query
        .split('#')
        .next()
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value.trim())
}

/// Drives one course through the run states
pub struct RunController<'a> {
    matcher: &'a mut Matcher,
    memory: &'a mut CourseMemory,
    mode: MatchMode,
    trail: Vec<RunState>,
}

impl<'a> RunController<'a> {
    pub fn new(matcher: &'a mut Matcher, memory: &'a mut CourseMemory) -> Self {
        Self {
            matcher,
            memory,
            mode: MatchMode::Automatic,
            trail: Vec::new(),
        }
    }

    /// Set the match mode used for titles not in memory
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// States visited by the last run
    pub fn trail(&self) -> &[RunState] {
        &self.trail
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.trail.last().copied().unwrap_or(RunState::Init)
    }

    fn enter(&mut self, state: RunState) {
        tracing::debug!(state = %state, "Run state");
        self.trail.push(state);
    }

    /// Run the whole pipeline for `course` (bare id or course URL).
    pub fn run(
        &mut self,
        course: &str,
        source: &mut dyn TitleSource,
        review: Option<&mut dyn ReviewHook>,
    ) -> MapperResult<RunOutcome> {
        self.trail.clear();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        self.enter(RunState::Init);

        match self.execute(run_id, started_at, course, source, review) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let failed_in = self.state();
                self.enter(RunState::Failed);
                tracing::error!(run_id = %run_id, state = %failed_in, error = %e, "Run failed");
                Err(e)
            }
        }
    }

    fn execute(
        &mut self,
        run_id: Uuid,
        started_at: DateTime<Utc>,
        course: &str,
        source: &mut dyn TitleSource,
        review: Option<&mut dyn ReviewHook>,
    ) -> MapperResult<RunOutcome> {
        let course_id = parse_course_id(course)
            .ok_or_else(|| MapperError::invalid_operation(format!("Invalid course id or URL: {}", course)))?;
        tracing::info!(run_id = %run_id, course = %course_id, "Starting run");

        // Memory check
        self.enter(RunState::CheckMemory);
        let reuse = self.memory.last_accessed_course() == Some(course_id.as_str())
            && self.memory.course_len(&course_id) > 0;
        self.memory.select_course(course_id.as_str());

        let titles = if reuse {
            self.enter(RunState::ReuseMemory);
            let titles = self.memory.lesson_order()?;
            tracing::info!(course = %course_id, lessons = titles.len(), "Reusing course memory");
            titles
        } else {
            self.enter(RunState::FreshExtraction);
            let fetched = source.fetch_titles(&course_id)?;
            let titles = dedupe_titles(fetched);
            if titles.is_empty() {
                return Err(MapperError::pipeline(format!("No lessons found for course {}", course_id)));
            }
            tracing::info!(course = %course_id, lessons = titles.len(), "Lesson titles extracted");
            titles
        };

        // Matching
        self.enter(RunState::Match);
        let mut slots: Vec<Option<(LessonRecord, Provenance)>> = Vec::with_capacity(titles.len());
        let mut pending: Vec<String> = Vec::new();
        for title in &titles {
            match self.memory.get(title)? {
                Some(topics) => {
                    tracing::debug!(title = %title, "Memory hit");
                    let candidates = topics.iter().map(MatchCandidate::cached).collect();
                    slots.push(Some((LessonRecord::new(title.as_str(), normalize(title), candidates), Provenance::Cache)));
                }
                None => {
                    tracing::debug!(title = %title, "Memory miss");
                    slots.push(None);
                    pending.push(title.clone());
                }
            }
        }

        let mut matched = if pending.is_empty() {
            Vec::new()
        } else {
            tracing::info!(pending = pending.len(), "Matching titles missing from memory");
            self.matcher.match_titles(&pending, &self.mode)?
        }
        .into_iter();

        let mut entries: Vec<(LessonRecord, Provenance)> = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Some(entry) => entries.push(entry),
                None => {
                    let record = matched
                        .next()
                        .ok_or_else(|| MapperError::pipeline("Matcher returned fewer records than titles"))?;
                    entries.push((record, Provenance::Matched));
                }
            }
        }

        // Human review
        self.enter(RunState::MergeWithOverrides);
        if let Some(hook) = review {
            let records: Vec<LessonRecord> = entries.iter().map(|(r, _)| r.clone()).collect();
            if let Some(overrides) = hook.review(&records)? {
                apply_overrides(&mut entries, overrides);
            }
        }

        // Persistence
        self.enter(RunState::Persist);
        if !reuse {
            self.memory.set_lesson_order(&titles)?;
        }
        for (record, _) in &entries {
            if record.error.is_none() {
                self.memory.set(record.title.as_str(), record.topics())?;
            }
        }
        let persisted = match self.memory.persist() {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!(path = %self.memory.path().display(), error = %e, "Failed to save course memory");
                false
            }
        };

        self.enter(RunState::Done);
        let summary = summarize(&entries);
        let records: Vec<LessonRecord> = entries.into_iter().map(|(r, _)| r).collect();
        let tasks = records.iter().map(LessonRecord::to_task).collect();

        tracing::info!(
            run_id = %run_id,
            course = %course_id,
            total = summary.total,
            mapped = summary.mapped,
            from_cache = summary.from_cache,
            overridden = summary.overridden,
            "Run finished"
        );

        Ok(RunOutcome {
            run_id,
            course_id,
            reused_memory: reuse,
            states: self.trail.clone(),
            records,
            tasks,
            persisted,
            started_at,
            finished_at: Utc::now(),
            summary,
        })
    }
}

/// Drop blank and repeated titles, keeping first occurrences
fn dedupe_titles(titles: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn apply_overrides(entries: &mut [(LessonRecord, Provenance)], overrides: Overrides) {
    for (title, topics) in overrides {
        match entries.iter_mut().find(|(r, _)| r.title == title) {
            Some((record, provenance)) => {
                tracing::debug!(title = %title, topics = topics.len(), "Applying review override");
                record.set_candidates(topics.into_iter().map(MatchCandidate::manual).collect());
                record.error = None;
                *provenance = Provenance::Override;
            }
            None => {
                tracing::warn!(title = %title, "Override for a title not in this run, ignoring it");
            }
        }
    }
}

fn summarize(entries: &[(LessonRecord, Provenance)]) -> RunSummary {
    let mut summary = RunSummary {
        total: entries.len(),
        ..Default::default()
    };
    for (record, provenance) in entries {
        if record.mapped {
            summary.mapped += 1;
        } else {
            summary.unmapped += 1;
        }
        if record.error.is_some() {
            summary.failed += 1;
        }
        match provenance {
            Provenance::Cache => summary.from_cache += 1,
            Provenance::Matched => summary.matched += 1,
            Provenance::Override => summary.overridden += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatcherConfig;
    use crate::embeddings::{Embedder, EmbeddingIndex, HashingEmbedder};
    use lessonmap_core::{Origin, Subject, Taxonomy};
    use std::collections::BTreeMap;
    use tempfile::{TempDir, tempdir};

    const CRIMES: &str = "Aula 01: Crimes Contra a Vida — tentativa e consumação";

    /// Embedder that refuses to work, proving the model was never needed
    struct UnusableEmbedder;

    impl Embedder for UnusableEmbedder {
        fn model_id(&self) -> &str {
            "unusable"
        }

        fn dimensions(&self) -> usize {
            8
        }

        fn embed_batch(&mut self, _texts: &[String]) -> MapperResult<Vec<Vec<f32>>> {
            Err(MapperError::embedding("model not available"))
        }
    }

    /// Embedder that fails on any text mentioning "boom"
    struct PickyEmbedder(HashingEmbedder);

    impl Embedder for PickyEmbedder {
        fn model_id(&self) -> &str {
            self.0.model_id()
        }

        fn dimensions(&self) -> usize {
            self.0.dimensions()
        }

        fn embed_batch(&mut self, texts: &[String]) -> MapperResult<Vec<Vec<f32>>> {
            if texts.iter().any(|t| t.contains("boom")) {
                return Err(MapperError::embedding("encoder exploded"));
            }
            self.0.embed_batch(texts)
        }
    }

    /// Title source that counts its calls
    struct CountingSource {
        titles: Vec<String>,
        calls: usize,
    }

    impl CountingSource {
        fn new(titles: &[&str]) -> Self {
            Self {
                titles: titles.iter().map(|s| s.to_string()).collect(),
                calls: 0,
            }
        }
    }

    impl TitleSource for CountingSource {
        fn fetch_titles(&mut self, _course_id: &str) -> anyhow::Result<Vec<String>> {
            self.calls += 1;
            Ok(self.titles.clone())
        }
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy::from_subjects(vec![
            Subject::new(
                "Direito Penal",
                vec!["Crimes Contra a Vida".into(), "Crimes Contra o Patrimônio".into()],
            ),
            Subject::new(
                "Direito Administrativo",
                vec!["Atos Administrativos".into(), "Licitações".into()],
            ),
        ])
    }

    fn matcher(temp: &TempDir, embedder: Box<dyn Embedder>) -> Matcher {
        Matcher::new(
            taxonomy(),
            MatcherConfig::default().with_thresholds(0.5, 0.5, 0.5),
            embedder,
            EmbeddingIndex::new(temp.path().join("emb")),
        )
        .unwrap()
    }

    fn seeded_memory(temp: &TempDir) -> CourseMemory {
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        memory.select_course("111");
        memory.set("Aula 1", vec!["X".into()]).unwrap();
        memory.set("Aula 2", Vec::new()).unwrap();
        memory.persist().unwrap();
        CourseMemory::open(temp.path().join("memory.json"))
    }

    #[test]
    fn test_parse_course_id() {
        assert_eq!(parse_course_id("123"), Some("123".into()));
        assert_eq!(parse_course_id("https://bo/x?foo=1&id=42&tab=2"), Some("42".into()));
        assert_eq!(parse_course_id("https://bo/x?id=42#aulas"), Some("42".into()));
        assert_eq!(parse_course_id("https://bo/x?id="), None);
        assert_eq!(parse_course_id("   "), None);
        assert_eq!(parse_course_id("two words"), None);
    }

    #[test]
    fn test_parse_course_id_ignores_similar_params() {
        assert_eq!(parse_course_id("https://bo/x?id=42&uid=7"), Some("42".into()));
        assert_eq!(parse_course_id("https://bo/x?courseid=9&id=3"), Some("3".into()));
        assert_eq!(parse_course_id("https://bo/x?uid=7"), None);
        assert_eq!(parse_course_id("id=15"), Some("15".into()));
    }

    #[test]
    fn test_same_course_reuses_memory_without_extraction() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = seeded_memory(&temp);
        let mut matcher = matcher(&temp, Box::new(UnusableEmbedder));
        let mut source = CountingSource::new(&["never used"]);

        let mut controller = RunController::new(&mut matcher, &mut memory);
        let outcome = controller.run("https://bo/curso?id=111", &mut source, None).unwrap();

        assert_eq!(source.calls, 0);
        assert!(outcome.reused_memory);
        assert_eq!(
            outcome.states,
            vec![
                RunState::Init,
                RunState::CheckMemory,
                RunState::ReuseMemory,
                RunState::Match,
                RunState::MergeWithOverrides,
                RunState::Persist,
                RunState::Done,
            ]
        );
        assert_eq!(outcome.summary.from_cache, 2);
        assert_eq!(outcome.summary.mapped, 1);
        assert_eq!(outcome.records[0].candidates[0].origin, Origin::Cache);
        assert_eq!(outcome.tasks[0], TaskRecord::new("Aula 1", vec!["X".into()]));
        assert!(!outcome.tasks[1].mapped);
        assert!(!outcome.persisted);
    }

    #[test]
    fn test_new_course_extracts_and_matches() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = seeded_memory(&temp);
        let mut matcher = matcher(&temp, Box::new(HashingEmbedder::default()));
        let mut source = CountingSource::new(&[CRIMES, "Aula 00: Apresentação do curso"]);

        let outcome = RunController::new(&mut matcher, &mut memory)
            .run("222", &mut source, None)
            .unwrap();

        assert_eq!(source.calls, 1);
        assert!(!outcome.reused_memory);
        assert!(outcome.states.contains(&RunState::FreshExtraction));
        assert_eq!(outcome.summary.matched, 2);
        assert_eq!(outcome.summary.mapped, 1);
        assert_eq!(outcome.records[0].topics(), vec!["Crimes Contra a Vida".to_string()]);
        assert!(outcome.persisted);

        memory.select_course("222");
        assert_eq!(memory.get(CRIMES).unwrap(), Some(["Crimes Contra a Vida".to_string()].as_slice()));
        assert_eq!(memory.get("Aula 00: Apresentação do curso").unwrap(), Some([].as_slice()));
        memory.select_course("111");
        assert_eq!(memory.course_len("111"), 2);
    }

    #[test]
    fn test_cached_titles_are_not_rematched() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");
        let mut memory = CourseMemory::open(&path);
        memory.select_course("222");
        memory.set(CRIMES, vec!["Manual Topic".into()]).unwrap();
        memory.select_course("111");

        let mut matcher = matcher(&temp, Box::new(HashingEmbedder::default()));
        let mut source = CountingSource::new(&[CRIMES, "Aula 05: Licitações"]);
        let outcome = RunController::new(&mut matcher, &mut memory)
            .run("222", &mut source, None)
            .unwrap();

        assert!(!outcome.reused_memory);
        assert_eq!(outcome.records[0].topics(), vec!["Manual Topic".to_string()]);
        assert_eq!(outcome.records[0].origin(), Some(Origin::Cache));
        assert_eq!(outcome.records[1].topics(), vec!["Licitações".to_string()]);
        assert_eq!(outcome.summary.from_cache, 1);
        assert_eq!(outcome.summary.matched, 1);
    }

    #[test]
    fn test_overrides_win_and_are_persisted() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        let mut matcher = matcher(&temp, Box::new(HashingEmbedder::default()));
        let mut source = CountingSource::new(&[CRIMES, "Aula 05: Licitações"]);

        let mut overrides = BTreeMap::new();
        overrides.insert(CRIMES.to_string(), Vec::new());
        overrides.insert("Aula 05: Licitações".to_string(), vec!["Licitações".into(), "Contratos".into()]);
        overrides.insert("Not in course".to_string(), vec!["X".into()]);
        let mut review = FixedOverrides::new(overrides);

        let outcome = RunController::new(&mut matcher, &mut memory)
            .run("333", &mut source, Some(&mut review))
            .unwrap();

        assert!(!outcome.records[0].mapped);
        assert_eq!(outcome.records[1].origin(), Some(Origin::Manual));
        assert_eq!(outcome.summary.overridden, 2);
        assert_eq!(outcome.records.len(), 2);

        let mut reloaded = CourseMemory::open(temp.path().join("memory.json"));
        reloaded.select_course("333");
        assert_eq!(reloaded.get(CRIMES).unwrap(), Some([].as_slice()));
        assert_eq!(reloaded.get("Aula 05: Licitações").unwrap().map(|t| t.len()), Some(2));
        assert_eq!(reloaded.get("Not in course").unwrap(), None);
    }

    #[test]
    fn test_empty_extraction_fails_run() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        let mut matcher = matcher(&temp, Box::new(HashingEmbedder::default()));
        let mut source = CountingSource::new(&["  "]);

        let mut controller = RunController::new(&mut matcher, &mut memory);
        let err = controller.run("444", &mut source, None).unwrap_err();

        assert!(matches!(err, MapperError::Pipeline { .. }));
        assert_eq!(controller.state(), RunState::Failed);
        assert_eq!(
            controller.trail(),
            &[RunState::Init, RunState::CheckMemory, RunState::FreshExtraction, RunState::Failed]
        );
    }

    #[test]
    fn test_model_failure_fails_run() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        let mut matcher = matcher(&temp, Box::new(UnusableEmbedder));
        let mut source = CountingSource::new(&[CRIMES]);

        let mut controller = RunController::new(&mut matcher, &mut memory);
        assert!(controller.run("555", &mut source, None).unwrap_err().is_embedding());
        assert_eq!(controller.state(), RunState::Failed);
    }

    #[test]
    fn test_invalid_course_fails_run() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        let mut matcher = matcher(&temp, Box::new(HashingEmbedder::default()));
        let mut source = CountingSource::new(&[CRIMES]);

        let mut controller = RunController::new(&mut matcher, &mut memory);
        assert!(controller.run("https://bo/curso", &mut source, None).is_err());
        assert_eq!(controller.trail(), &[RunState::Init, RunState::Failed]);
        assert_eq!(source.calls, 0);
    }

    #[test]
    fn test_persist_failure_does_not_fail_run() {
        let temp = tempdir().expect("Failed to create temp dir");
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut memory = CourseMemory::open(blocker.join("memory.json"));
        let mut matcher = matcher(&temp, Box::new(HashingEmbedder::default()));
        let mut source = CountingSource::new(&[CRIMES]);

        let outcome = RunController::new(&mut matcher, &mut memory)
            .run("666", &mut source, None)
            .unwrap();

        assert!(!outcome.persisted);
        assert_eq!(outcome.states.last(), Some(&RunState::Done));
        assert!(memory.is_dirty());
        assert_eq!(memory.get(CRIMES).unwrap().map(|t| t.len()), Some(1));
    }

    #[test]
    fn test_failed_titles_are_not_stored() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        let mut matcher = matcher(&temp, Box::new(PickyEmbedder(HashingEmbedder::default())));
        let mut source = CountingSource::new(&["Aula 09: boom", CRIMES]);

        let outcome = RunController::new(&mut matcher, &mut memory)
            .run("777", &mut source, None)
            .unwrap();

        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.mapped, 1);
        assert_eq!(memory.get("Aula 09: boom").unwrap(), None);
        assert!(memory.get(CRIMES).unwrap().is_some());
    }

    #[test]
    fn test_reused_run_retries_failed_titles() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");
        let titles = [CRIMES, "Aula 02: boom"];

        let mut memory = CourseMemory::open(&path);
        let mut matcher = matcher(&temp, Box::new(PickyEmbedder(HashingEmbedder::default())));
        let mut source = CountingSource::new(&titles);
        let first = RunController::new(&mut matcher, &mut memory)
            .run("1", &mut source, None)
            .unwrap();
        assert_eq!(first.tasks.len(), 2);
        assert_eq!(first.summary.failed, 1);

        let mut memory = CourseMemory::open(&path);
        let second = RunController::new(&mut matcher, &mut memory)
            .run("1", &mut source, None)
            .unwrap();

        assert!(second.reused_memory);
        assert_eq!(source.calls, 1);
        let task_titles: Vec<&str> = second.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(task_titles, titles);
        assert_eq!(second.summary.from_cache, 1);
        assert_eq!(second.summary.matched, 1);
        assert_eq!(second.summary.failed, 1);
    }

    #[test]
    fn test_reused_run_keeps_course_order() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");
        let titles = ["Aula 2: Crimes Contra a Vida", "Aula 10: Licitações", "Aula 1: Atos Administrativos"];

        let mut hashing = matcher(&temp, Box::new(HashingEmbedder::default()));
        let mut idle = matcher(&temp, Box::new(UnusableEmbedder));

        let mut memory = CourseMemory::open(&path);
        let mut source = CountingSource::new(&titles);
        let fresh = RunController::new(&mut hashing, &mut memory)
            .run("2", &mut source, None)
            .unwrap();

        let mut memory = CourseMemory::open(&path);
        let reuse = RunController::new(&mut idle, &mut memory)
            .run("2", &mut source, None)
            .unwrap();

        assert!(!fresh.reused_memory);
        assert!(reuse.reused_memory);
        assert_eq!(reuse.tasks, fresh.tasks);
        assert_eq!(reuse.tasks.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), titles);

        memory.select_course("2");
        assert_eq!(memory.export_tasks().unwrap(), fresh.tasks);
    }

    #[test]
    fn test_outcome_serializes() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = seeded_memory(&temp);
        let mut matcher = matcher(&temp, Box::new(UnusableEmbedder));
        let mut source = StaticTitles::default();

        let outcome = RunController::new(&mut matcher, &mut memory)
            .run("111", &mut source, None)
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["courseId"], "111");
        assert_eq!(json["reusedMemory"], true);
        assert_eq!(json["states"][2], "reuse_memory");
        assert_eq!(json["summary"]["fromCache"], 2);
        assert!(outcome.duration() >= chrono::Duration::zero());
    }
}
