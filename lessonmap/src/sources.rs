//! File-backed collaborators for `lessonmap run`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use lessonmap_sdk::pipeline::Overrides;
use lessonmap_sdk::types::LessonRecord;
use lessonmap_sdk::{ReviewHook, TitleSource};

/// Reads lesson titles from a file.
///
/// A file whose content starts with `[` is read as a JSON array of strings.
/// Anything else is one title per line; blank lines and `#` comments are
/// skipped.
#[derive(Debug, Clone)]
pub struct FileTitleSource {
    path: PathBuf,
}

impl FileTitleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TitleSource for FileTitleSource {
    fn fetch_titles(&mut self, course_id: &str) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read titles from {}", self.path.display()))?;

        let titles = parse_titles(&content)
            .with_context(|| format!("Failed to parse titles in {}", self.path.display()))?;

        tracing::debug!(course = course_id, count = titles.len(), path = %self.path.display(), "Titles loaded");
        Ok(titles)
    }
}

fn parse_titles(content: &str) -> Result<Vec<String>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Review hook backed by a JSON object of `title → [topics]`
#[derive(Debug, Clone)]
pub struct OverridesFile {
    path: PathBuf,
}

impl OverridesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Overrides> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read overrides from {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid overrides file {}", self.path.display()))
    }
}

impl ReviewHook for OverridesFile {
    fn review(&mut self, records: &[LessonRecord]) -> Result<Option<Overrides>> {
        let overrides = self.load()?;
        tracing::info!(
            entries = overrides.len(),
            records = records.len(),
            path = %self.path.display(),
            "Applying overrides file"
        );
        Ok((!overrides.is_empty()).then_some(overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_plain_text_titles() {
        let titles = parse_titles("# Curso 123\nAula 01: Introdução\n\n  Aula 02: Crimes  \n").unwrap();
        assert_eq!(titles, vec!["Aula 01: Introdução", "Aula 02: Crimes"]);
    }

    #[test]
    fn test_json_titles() {
        let titles = parse_titles(r#"  ["Aula 01", "Aula 02"]"#).unwrap();
        assert_eq!(titles, vec!["Aula 01", "Aula 02"]);
        assert!(parse_titles("[1, 2]").is_err());
    }

    #[test]
    fn test_file_source_missing_file() {
        let temp = tempdir().unwrap();
        let mut source = FileTitleSource::new(temp.path().join("absent.txt"));
        assert!(source.fetch_titles("1").is_err());
    }

    #[test]
    fn test_overrides_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("overrides.json");
        std::fs::write(&path, r#"{"Aula 01": ["Licitações"], "Aula 02": []}"#).unwrap();

        let mut hook = OverridesFile::new(&path);
        let overrides = hook.review(&[]).unwrap().unwrap();
        assert_eq!(overrides["Aula 01"], vec!["Licitações".to_string()]);
        assert!(overrides["Aula 02"].is_empty());

        std::fs::write(&path, "{}").unwrap();
        assert_eq!(hook.review(&[]).unwrap(), None);
    }
}
