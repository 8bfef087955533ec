//! Interactive terminal review for `lessonmap run --review`.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use lessonmap_sdk::pipeline::Overrides;
use lessonmap_sdk::types::LessonRecord;
use lessonmap_sdk::ReviewHook;

use crate::commands::render_record;

/// Shows every record and lets the user replace topic lists before saving.
pub struct PromptReview {
    high_confidence: f32,
    known_topics: BTreeSet<String>,
    theme: ColorfulTheme,
}

impl PromptReview {
    pub fn new(high_confidence: f32, known_topics: impl IntoIterator<Item = String>) -> Self {
        Self {
            high_confidence,
            known_topics: known_topics.into_iter().collect(),
            theme: ColorfulTheme::default(),
        }
    }

    fn menu_items(records: &[LessonRecord], overrides: &Overrides) -> Vec<String> {
        let mut items: Vec<String> = records
            .iter()
            .map(|record| {
                let topics = overrides.get(&record.title).cloned().unwrap_or_else(|| record.topics());
                let edited = if overrides.contains_key(&record.title) { " (edited)" } else { "" };
                if topics.is_empty() {
                    format!("{} → (none){}", record.title, edited)
                } else {
                    format!("{} → {}{}", record.title, topics.join(", "), edited)
                }
            })
            .collect();
        items.push("Done".to_string());
        items
    }

    /// Write the records under review to `out`.
    ///
    /// The prompts draw on stderr and stdout may be carrying task JSON, so
    /// the review always writes here with stderr.
    fn write_listing(&self, out: &mut dyn Write, records: &[LessonRecord]) -> std::io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", "Review".cyan().bold())?;
        writeln!(out, "{}", "─".repeat(50))?;
        for record in records {
            writeln!(out, "{}", render_record(record, self.high_confidence))?;
        }
        writeln!(out)
    }
}

impl ReviewHook for PromptReview {
    fn review(&mut self, records: &[LessonRecord]) -> Result<Option<Overrides>> {
        if records.is_empty() {
            return Ok(None);
        }

        self.write_listing(&mut std::io::stderr(), records)?;

        let mut overrides = Overrides::new();
        loop {
            let items = Self::menu_items(records, &overrides);
            let done = items.len() - 1;
            let choice = Select::with_theme(&self.theme)
                .with_prompt("Pick a lesson to edit")
                .items(&items)
                .default(done)
                .interact()?;
            if choice == done {
                break;
            }

            let record = &records[choice];
            let current = overrides
                .get(&record.title)
                .cloned()
                .unwrap_or_else(|| record.topics());
            let input: String = Input::with_theme(&self.theme)
                .with_prompt("Topics (comma separated, empty for none)")
                .with_initial_text(current.join(", "))
                .allow_empty(true)
                .interact_text()?;

            let topics = parse_topic_list(&input);
            for topic in topics.iter().filter(|t| !self.known_topics.contains(*t)) {
                eprintln!("  {} {} is not a taxonomy topic", "○".yellow(), topic);
            }
            overrides.insert(record.title.clone(), topics);
        }

        Ok((!overrides.is_empty()).then_some(overrides))
    }
}

/// Split a comma separated list, dropping blanks and repeats.
pub fn parse_topic_list(input: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonmap_sdk::types::MatchCandidate;

    #[test]
    fn test_parse_topic_list() {
        assert_eq!(
            parse_topic_list(" Licitações, Atos Administrativos ,,Licitações"),
            vec!["Licitações".to_string(), "Atos Administrativos".to_string()]
        );
        assert!(parse_topic_list("  ").is_empty());
    }

    #[test]
    fn test_menu_items_show_edits() {
        let records = vec![
            LessonRecord::new("Aula 01", "aula 01", vec![MatchCandidate::cached("Licitações")]),
            LessonRecord::new("Aula 02", "aula 02", vec![]),
        ];
        let mut overrides = Overrides::new();
        overrides.insert("Aula 02".to_string(), vec![]);

        let items = PromptReview::menu_items(&records, &overrides);
        assert_eq!(items, vec!["Aula 01 → Licitações", "Aula 02 → (none) (edited)", "Done"]);
    }

    #[test]
    fn test_listing_goes_to_given_writer() {
        let review = PromptReview::new(0.85, Vec::new());
        let records = vec![LessonRecord::new("Aula 01", "aula 01", vec![MatchCandidate::cached("Licitações")])];

        let mut out = Vec::new();
        review.write_listing(&mut out, &records).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Review"));
        assert!(text.contains("Aula 01"));
    }

    #[test]
    fn test_empty_records_skip_prompt() {
        let mut review = PromptReview::new(0.85, Vec::new());
        assert_eq!(review.review(&[]).unwrap(), None);
    }
}
