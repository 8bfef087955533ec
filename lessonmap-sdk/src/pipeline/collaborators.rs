//! Boundaries to the systems around a run.
//!
//! Lesson extraction and human review live outside this crate. A run only
//! talks to them through these traits, so a browser robot, a file reader
//! or a GUI dialog can stand behind either one.

use std::collections::BTreeMap;

use lessonmap_core::LessonRecord;

/// Supplies the lesson titles of a course
pub trait TitleSource {
    /// Every lesson title of `course_id`, in course order
    fn fetch_titles(&mut self, course_id: &str) -> anyhow::Result<Vec<String>>;
}

/// Title → topics supplied by a reviewer
pub type Overrides = BTreeMap<String, Vec<String>>;

/// Lets a human correct the matcher before results are stored
pub trait ReviewHook {
    /// Inspect the records of a run.
    ///
    /// Returning `None` accepts everything as is. Every entry of a returned
    /// map replaces that title's topics verbatim, an empty list included.
    fn review(&mut self, records: &[LessonRecord]) -> anyhow::Result<Option<Overrides>>;
}

/// Fixed title list, handy for callers that already have the titles
#[derive(Debug, Clone, Default)]
pub struct StaticTitles {
    titles: Vec<String>,
}

impl StaticTitles {
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            titles: titles.into_iter().map(Into::into).collect(),
        }
    }
}

impl TitleSource for StaticTitles {
    fn fetch_titles(&mut self, _course_id: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.titles.clone())
    }
}

/// Review hook that always applies the same overrides
#[derive(Debug, Clone, Default)]
pub struct FixedOverrides {
    overrides: Overrides,
}

impl FixedOverrides {
    pub fn new(overrides: Overrides) -> Self {
        Self { overrides }
    }
}

impl ReviewHook for FixedOverrides {
    fn review(&mut self, _records: &[LessonRecord]) -> anyhow::Result<Option<Overrides>> {
        if self.overrides.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.overrides.clone()))
        }
    }
}
