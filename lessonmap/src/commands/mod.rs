//! Command implementations for lessonmap CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod doctor;
pub mod index;
pub mod matching;
pub mod memory;
pub mod run;
pub mod taxonomy;

use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use lessonmap_sdk::types::{LessonRecord, MatchMode, Origin};
use lessonmap_sdk::{Mapper, MatcherPreset};
use serde::Serialize;

use crate::cli::MatchOptions;
use crate::config::Config;

/// Build a mapper from the config plus command-line overrides.
///
/// `--focus` without `--preset` selects the focused preset.
pub fn open_mapper(config: &Config, options: &MatchOptions) -> Result<(Mapper, MatchMode)> {
    let preset = options
        .preset
        .or_else(|| (!options.focus.is_empty()).then_some(MatcherPreset::Focused));

    let mut mapper_config = config.mapper_config(preset);
    if let Some(top_k) = options.top_k {
        mapper_config.matcher.top_k = top_k;
    }

    let mapper = Mapper::new(mapper_config).context("Failed to initialize mapper")?;

    let mode = if options.focus.is_empty() {
        MatchMode::Automatic
    } else {
        for subject in &options.focus {
            if mapper.taxonomy().subject(subject).is_none() {
                tracing::warn!(subject = %subject, "Focus subject not found in taxonomy");
            }
        }
        MatchMode::focused(options.focus.iter().cloned())
    };

    Ok((mapper, mode))
}

/// Load the model and index behind a spinner
pub fn prepare(mapper: &mut Mapper) -> Result<()> {
    let pb = spinner("Loading embedding model and taxonomy index");
    let result = mapper.prepare();
    pb.finish_and_clear();
    result.context("Failed to prepare embedding index")
}

pub fn spinner(message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn origin_badge(origin: Origin) -> ColoredString {
    match origin {
        Origin::Hierarchical => "hierarchical".dimmed(),
        Origin::Fallback => "fallback".dimmed(),
        Origin::Cache => "cache".cyan(),
        Origin::Manual => "manual".magenta(),
    }
}

/// Human-readable block for one record
pub fn render_record(record: &LessonRecord, high_confidence: f32) -> String {
    let marker = if record.error.is_some() {
        "✗".red()
    } else if record.mapped {
        "✓".green()
    } else {
        "○".yellow()
    };

    let mut out = format!("  {} {}", marker, record.title.bold());

    if let Some(error) = &record.error {
        out.push_str(&format!("\n      {}", error.red()));
        return out;
    }
    if !record.mapped {
        out.push_str(&format!("\n      {}", "no topic".dimmed()));
    }

    for candidate in &record.candidates {
        let score = if candidate.origin.is_ai() {
            let score = format!("{:.2}", candidate.score);
            if candidate.score >= high_confidence {
                score.green()
            } else {
                score.yellow()
            }
        } else {
            "  - ".normal()
        };
        out.push_str(&format!(
            "\n      {} {} [{}]",
            score,
            candidate.term,
            origin_badge(candidate.origin)
        ));
    }

    out
}

/// Pretty JSON to a file, or to stdout when no path is given
pub fn write_json<T: Serialize + ?Sized>(value: &T, output: Option<&Path>) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("Failed to serialize output")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).context("Failed to create output directory")?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => println!("{}", content),
    }

    Ok(())
}
