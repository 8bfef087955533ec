//! Upgrade path for the single-course memory format.
//!
//! Before memory was scoped by course the file was either a flat
//! `{title: [topic, ...]}` map or a single-course envelope
//! `{"courseId": "...", "matches": {title: [topic, ...]}}`. Both are lifted
//! into the multi-course layout with the data kept under its course id.

use serde::Deserialize;
use serde_json::Value;

use super::{CourseEntries, MemoryFile, MemoryMeta};

#[derive(Debug, Deserialize)]
struct SingleCourseFile {
    #[serde(alias = "course_id", alias = "courseId")]
    course: String,
    #[serde(alias = "cache", alias = "data")]
    matches: CourseEntries,
}

/// Try to read `value` as one of the single-course layouts.
///
/// Returns `None` when the value matches neither layout.
pub(crate) fn upgrade(value: Value, legacy_course_id: &str) -> Option<MemoryFile> {
    if let Ok(single) = serde_json::from_value::<SingleCourseFile>(value.clone()) {
        return Some(single_course(single.course, single.matches));
    }

    let flat: CourseEntries = serde_json::from_value(value).ok()?;
    Some(single_course(legacy_course_id.to_string(), flat))
}

fn single_course(course_id: String, entries: CourseEntries) -> MemoryFile {
    let mut file = MemoryFile {
        meta: MemoryMeta {
            last_accessed_course_id: Some(course_id.clone()),
        },
        ..Default::default()
    };
    file.courses.insert(course_id, entries);
    file
}
