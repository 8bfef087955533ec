//! Cross-run course memory.
//!
//! Persists the accepted topics of every lesson title, scoped by course, so
//! a later run can skip matching and so human corrections survive:
//!
//! ```json
//! {
//!   "meta": {"lastAccessedCourseId": "111"},
//!   "courses": {"111": {"Aula 1": ["X"]}, "222": {}},
//!   "lessons": {"111": ["Aula 1", "Aula 2"]}
//! }
//! ```
//!
//! `lessons` keeps each course's titles in course order, including titles
//! that have no stored topics yet. Files without it fall back to the order
//! of the `courses` keys.
//!
//! The whole file is read on open and rewritten on [`CourseMemory::persist`].
//! Writes only happen when something changed. There is no locking: two
//! processes sharing one file race and the last writer wins.
//!
//! ## Usage
//!
//! ```no_run
//! use lessonmap_core::memory::CourseMemory;
//!
//! let mut memory = CourseMemory::open("course_memory.json");
//! memory.select_course("111");
//! memory.set("Aula 1", vec!["Crimes Contra a Vida".into()])?;
//! memory.persist()?;
//! # Ok::<(), lessonmap_core::Error>(())
//! ```

mod legacy;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::TaskRecord;

/// Title → accepted topics for one course
pub type CourseEntries = BTreeMap<String, Vec<String>>;

/// Course id used when upgrading a flat single-course file
pub const DEFAULT_LEGACY_COURSE_ID: &str = "legacy";

/// File-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMeta {
    #[serde(default)]
    pub last_accessed_course_id: Option<String>,
}

/// On-disk layout of the memory file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFile {
    #[serde(default)]
    pub meta: MemoryMeta,
    #[serde(default)]
    pub courses: BTreeMap<String, CourseEntries>,
    /// Course id → lesson titles in course order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lessons: BTreeMap<String, Vec<String>>,
}

/// Options for opening a memory file
#[derive(Debug, Clone)]
pub struct MemoryOptions {
    /// Course id that receives the entries of a flat single-course file
    pub legacy_course_id: String,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            legacy_course_id: DEFAULT_LEGACY_COURSE_ID.to_string(),
        }
    }
}

/// Multi-course persistent memory
#[derive(Debug)]
pub struct CourseMemory {
    path: PathBuf,
    data: MemoryFile,
    active: Option<String>,
    dirty: bool,
}

impl CourseMemory {
    /// Open the memory file with default options.
    ///
    /// A missing file starts an empty memory. A corrupt file is logged and
    /// also starts empty; it is overwritten on the next persist.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with(path, &MemoryOptions::default())
    }

    /// Open the memory file.
    pub fn open_with(path: impl Into<PathBuf>, options: &MemoryOptions) -> Self {
        let path = path.into();
        let (data, dirty) = match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&path, &content, options),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No memory file found, a new one will be created");
                (MemoryFile::default(), false)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read memory file, starting empty");
                (MemoryFile::default(), false)
            }
        };

        Self {
            path,
            data,
            active: None,
            dirty,
        }
    }

    /// Parse file content, upgrading the single-course layout when needed.
    ///
    /// The returned flag is true when the data was upgraded and should be
    /// rewritten.
    fn parse(path: &Path, content: &str, options: &MemoryOptions) -> (MemoryFile, bool) {
        let value: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Memory file is corrupt, ignoring it");
                return (MemoryFile::default(), false);
            }
        };

        if value.get("courses").is_some_and(Value::is_object) {
            match serde_json::from_value::<MemoryFile>(value) {
                Ok(data) => {
                    tracing::info!(
                        path = %path.display(),
                        courses = data.courses.len(),
                        "Memory loaded"
                    );
                    return (data, false);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Memory file is corrupt, ignoring it");
                    return (MemoryFile::default(), false);
                }
            }
        }

        match legacy::upgrade(value, &options.legacy_course_id) {
            Some(data) => {
                tracing::info!(
                    path = %path.display(),
                    course = ?data.meta.last_accessed_course_id,
                    "Upgraded single-course memory file"
                );
                (data, true)
            }
            None => {
                tracing::warn!(path = %path.display(), "Memory file has an unknown layout, ignoring it");
                (MemoryFile::default(), false)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make `course_id` the active context.
    ///
    /// Creates an empty slot for an unseen course. Other courses are never
    /// touched.
    pub fn select_course(&mut self, course_id: impl Into<String>) {
        let course_id = course_id.into();

        if !self.data.courses.contains_key(&course_id) {
            self.data.courses.insert(course_id.clone(), CourseEntries::new());
            self.dirty = true;
        }
        if self.data.meta.last_accessed_course_id.as_deref() != Some(course_id.as_str()) {
            self.data.meta.last_accessed_course_id = Some(course_id.clone());
            self.dirty = true;
        }

        tracing::debug!(course = %course_id, entries = self.data.courses[&course_id].len(), "Course selected");
        self.active = Some(course_id);
    }

    /// Course selected in this process, if any
    pub fn active_course(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Course recorded as last accessed in the file
    pub fn last_accessed_course(&self) -> Option<&str> {
        self.data.meta.last_accessed_course_id.as_deref()
    }

    fn active_slot(&self) -> Result<&CourseEntries> {
        let id = self.active.as_ref().ok_or(Error::NoActiveCourse)?;
        self.data.courses.get(id).ok_or(Error::NoActiveCourse)
    }

    fn active_slot_mut(&mut self) -> Result<&mut CourseEntries> {
        let id = self.active.as_ref().ok_or(Error::NoActiveCourse)?;
        self.data.courses.get_mut(id).ok_or(Error::NoActiveCourse)
    }

    /// Topics stored for `title` in the active course
    pub fn get(&self, title: &str) -> Result<Option<&[String]>> {
        Ok(self.active_slot()?.get(title).map(Vec::as_slice))
    }

    /// Store topics for `title` in the active course.
    ///
    /// Returns true when the stored value changed.
    pub fn set(&mut self, title: impl Into<String>, topics: Vec<String>) -> Result<bool> {
        let title = title.into();
        let slot = self.active_slot_mut()?;
        if slot.get(&title) == Some(&topics) {
            return Ok(false);
        }

        slot.insert(title, topics);
        self.dirty = true;
        Ok(true)
    }

    /// Drop `title` from the active course.
    pub fn remove(&mut self, title: &str) -> Result<bool> {
        let removed = self.active_slot_mut()?.remove(title).is_some();
        if removed {
            self.dirty = true;
        }
        Ok(removed)
    }

    /// Empty the active course, returning how many titles were dropped.
    ///
    /// The recorded lesson order goes with it.
    pub fn clear_course(&mut self) -> Result<usize> {
        let slot = self.active_slot_mut()?;
        let count = slot.len();
        slot.clear();
        if count > 0 {
            self.dirty = true;
        }
        if let Some(id) = &self.active {
            if self.data.lessons.remove(id).is_some() {
                self.dirty = true;
            }
        }
        Ok(count)
    }

    /// Record the course order of the active course's lessons.
    ///
    /// Returns true when the stored order changed.
    pub fn set_lesson_order(&mut self, titles: &[String]) -> Result<bool> {
        self.active_slot()?;
        let id = self.active.clone().ok_or(Error::NoActiveCourse)?;
        if self.data.lessons.get(&id).map(Vec::as_slice) == Some(titles) {
            return Ok(false);
        }

        self.data.lessons.insert(id, titles.to_vec());
        self.dirty = true;
        Ok(true)
    }

    /// Lesson titles of the active course in course order.
    ///
    /// Starts with the recorded order, which may list titles that have no
    /// entry, then appends entries missing from it in key order.
    pub fn lesson_order(&self) -> Result<Vec<String>> {
        let slot = self.active_slot()?;
        let listed: &[String] = self
            .active
            .as_ref()
            .and_then(|id| self.data.lessons.get(id))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut order = listed.to_vec();
        order.extend(slot.keys().filter(|title| !listed.contains(*title)).cloned());
        Ok(order)
    }

    /// Read-only view of the active course
    pub fn entries(&self) -> Result<&CourseEntries> {
        self.active_slot()
    }

    /// Every entry of the active course as a downstream task record, in
    /// course order
    pub fn export_tasks(&self) -> Result<Vec<TaskRecord>> {
        let slot = self.active_slot()?;
        Ok(self
            .lesson_order()?
            .into_iter()
            .filter_map(|title| {
                let topics = slot.get(&title)?.clone();
                Some(TaskRecord::new(title, topics))
            })
            .collect())
    }

    pub fn course_ids(&self) -> Vec<&str> {
        self.data.courses.keys().map(String::as_str).collect()
    }

    /// Number of titles stored for a course (0 for unknown courses)
    pub fn course_len(&self, course_id: &str) -> usize {
        self.data.courses.get(course_id).map_or(0, BTreeMap::len)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Full in-memory state
    pub fn snapshot(&self) -> &MemoryFile {
        &self.data
    }

    /// Write the whole memory to disk if anything changed.
    ///
    /// Returns true when a write happened. On failure the in-memory state
    /// stays as it was and remains dirty.
    pub fn persist(&mut self) -> Result<bool> {
        if !self.dirty {
            tracing::debug!(path = %self.path.display(), "Memory unchanged, nothing to save");
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.data)?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;

        self.dirty = false;
        tracing::info!(
            path = %self.path.display(),
            courses = self.data.courses.len(),
            "Memory saved"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn topics(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_operations_before_selection_fail() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));

        assert!(memory.get("Aula 1").unwrap_err().is_no_active_course());
        assert!(memory.set("Aula 1", topics(&["X"])).unwrap_err().is_no_active_course());
        assert!(memory.export_tasks().is_err());
        assert!(memory.remove("Aula 1").is_err());
        assert!(!memory.is_dirty());
    }

    #[test]
    fn test_set_marks_dirty_only_on_change() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");
        let mut memory = CourseMemory::open(&path);
        memory.select_course("111");
        memory.persist().unwrap();
        assert!(!memory.is_dirty());

        assert!(memory.set("Aula 1", topics(&["X"])).unwrap());
        assert!(memory.is_dirty());
        memory.persist().unwrap();

        assert!(!memory.set("Aula 1", topics(&["X"])).unwrap());
        assert!(!memory.is_dirty());
        assert!(!memory.persist().unwrap());

        assert!(memory.set("Aula 1", topics(&["Y"])).unwrap());
        assert!(memory.is_dirty());
    }

    #[test]
    fn test_scope_isolation() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));

        memory.select_course("A");
        memory.set("Aula 1", topics(&["X"])).unwrap();

        memory.select_course("B");
        assert_eq!(memory.get("Aula 1").unwrap(), None);

        memory.select_course("A");
        assert_eq!(memory.get("Aula 1").unwrap(), Some(topics(&["X"]).as_slice()));
    }

    #[test]
    fn test_switching_courses_keeps_other_slots() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");

        let mut memory = CourseMemory::open(&path);
        memory.select_course("111");
        memory.set("Aula 1", topics(&["X"])).unwrap();
        memory.persist().unwrap();

        let mut memory = CourseMemory::open(&path);
        memory.select_course("222");
        memory.select_course("111");
        assert_eq!(memory.get("Aula 1").unwrap(), Some(topics(&["X"]).as_slice()));
        assert_eq!(memory.course_len("222"), 0);
        assert!(memory.course_ids().contains(&"222"));
        assert_eq!(memory.last_accessed_course(), Some("111"));
    }

    #[test]
    fn test_persist_roundtrip() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("nested").join("memory.json");

        let mut memory = CourseMemory::open(&path);
        memory.select_course("111");
        memory.set("Aula 1", topics(&["X", "Y"])).unwrap();
        memory.set("Aula 2", Vec::new()).unwrap();
        memory.select_course("222");
        memory.set("Aula 9", topics(&["Z"])).unwrap();
        assert!(memory.persist().unwrap());

        let reloaded = CourseMemory::open(&path);
        assert_eq!(reloaded.snapshot().courses, memory.snapshot().courses);
        assert_eq!(reloaded.last_accessed_course(), Some("222"));
        assert!(!reloaded.is_dirty());
        assert_eq!(reloaded.active_course(), None);
    }

    #[test]
    fn test_file_layout() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");

        let mut memory = CourseMemory::open(&path);
        memory.select_course("111");
        memory.set("Aula 1", topics(&["X"])).unwrap();
        memory.persist().unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["meta"]["lastAccessedCourseId"], "111");
        assert_eq!(value["courses"]["111"]["Aula 1"][0], "X");
    }

    #[test]
    fn test_export_tasks() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        memory.select_course("111");
        memory.set("Aula 1", topics(&["X"])).unwrap();
        memory.set("Aula 2", Vec::new()).unwrap();

        let tasks = memory.export_tasks().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0], TaskRecord::new("Aula 1", topics(&["X"])));
        assert!(!tasks[1].mapped);
    }

    #[test]
    fn test_lesson_order_survives_reload() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");
        let order = topics(&["Aula 2: Penal", "Aula 10: Processo", "Aula 11: Falhou"]);

        let mut memory = CourseMemory::open(&path);
        memory.select_course("111");
        memory.set("Aula 2: Penal", topics(&["X"])).unwrap();
        memory.set("Aula 10: Processo", Vec::new()).unwrap();
        assert!(memory.set_lesson_order(&order).unwrap());
        assert!(!memory.set_lesson_order(&order).unwrap());
        memory.persist().unwrap();

        let mut memory = CourseMemory::open(&path);
        memory.select_course("111");
        assert_eq!(memory.lesson_order().unwrap(), order);

        let titles: Vec<String> = memory.export_tasks().unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, topics(&["Aula 2: Penal", "Aula 10: Processo"]));

        memory.set("Aula 05: Manual", topics(&["Y"])).unwrap();
        assert_eq!(memory.lesson_order().unwrap().last().map(String::as_str), Some("Aula 05: Manual"));

        memory.clear_course().unwrap();
        assert!(memory.lesson_order().unwrap().is_empty());
    }

    #[test]
    fn test_lesson_order_without_record_uses_keys() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        assert!(memory.set_lesson_order(&[]).unwrap_err().is_no_active_course());

        memory.select_course("111");
        memory.set("Aula 2", topics(&["X"])).unwrap();
        memory.set("Aula 1", topics(&["Y"])).unwrap();
        assert_eq!(memory.lesson_order().unwrap(), topics(&["Aula 1", "Aula 2"]));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");
        std::fs::write(&path, "{ definitely not json").unwrap();

        let mut memory = CourseMemory::open(&path);
        assert!(memory.course_ids().is_empty());
        assert_eq!(memory.last_accessed_course(), None);

        memory.select_course("111");
        memory.set("Aula 1", topics(&["X"])).unwrap();
        memory.persist().unwrap();
        assert_eq!(CourseMemory::open(&path).course_len("111"), 1);
    }

    #[test]
    fn test_legacy_file_is_upgraded() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("memory.json");
        std::fs::write(&path, r#"{"Aula 1": ["X"], "Aula 2": []}"#).unwrap();

        let options = MemoryOptions {
            legacy_course_id: "123456".into(),
        };
        let mut memory = CourseMemory::open_with(&path, &options);
        assert!(memory.is_dirty());
        assert_eq!(memory.last_accessed_course(), Some("123456"));

        memory.select_course("123456");
        assert_eq!(memory.get("Aula 1").unwrap(), Some(topics(&["X"]).as_slice()));

        memory.persist().unwrap();
        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["courses"]["123456"].is_object());
    }

    #[test]
    fn test_remove_and_clear() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut memory = CourseMemory::open(temp.path().join("memory.json"));
        memory.select_course("111");
        memory.set("Aula 1", topics(&["X"])).unwrap();
        memory.set("Aula 2", topics(&["Y"])).unwrap();

        assert!(memory.remove("Aula 1").unwrap());
        assert!(!memory.remove("Aula 1").unwrap());
        assert_eq!(memory.clear_course().unwrap(), 1);
        assert!(memory.entries().unwrap().is_empty());
    }
}
