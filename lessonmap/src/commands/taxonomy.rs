//! Taxonomy inspection.

use anyhow::{Context, Result};
use colored::Colorize;
use lessonmap_sdk::taxonomy::Taxonomy;
use serde_json::json;

use crate::cli::{TaxonomyAction, TaxonomyCommand};
use crate::commands::write_json;
use crate::config::Config;

/// Load the configured taxonomy the same way the mapper does
pub fn load(config: &Config) -> Result<Taxonomy> {
    let taxonomy = Taxonomy::load(&config.paths.taxonomy)
        .with_context(|| format!("Failed to load taxonomy {}", config.paths.taxonomy.display()))?;

    Ok(if config.matcher.subjects_in_fallback {
        taxonomy.with_subjects_in_fallback()
    } else {
        taxonomy
    })
}

pub fn execute(cmd: TaxonomyCommand, config: &Config) -> Result<()> {
    let taxonomy = load(config)?;

    match cmd.action {
        TaxonomyAction::Stats { json } => {
            if json {
                let subjects: Vec<_> = taxonomy
                    .subjects()
                    .iter()
                    .map(|s| json!({ "name": s.name, "topics": s.topics.len() }))
                    .collect();
                return write_json(
                    &json!({
                        "subjects": taxonomy.subjects().len(),
                        "topics": taxonomy.topic_count(),
                        "fallback": taxonomy.fallback().len(),
                        "bySubject": subjects,
                    }),
                    None,
                );
            }

            println!("{}", "Taxonomy".cyan().bold());
            println!("{}", "─".repeat(50));
            println!("  Source:   {}", config.paths.taxonomy.display());
            println!("  Subjects: {}", taxonomy.subjects().len());
            println!("  Topics:   {}", taxonomy.topic_count());
            println!("  Fallback: {}", taxonomy.fallback().len());
            println!();
            for subject in taxonomy.subjects() {
                let count = subject.topics.len();
                let count = if count == 0 {
                    "0".yellow()
                } else {
                    count.to_string().normal()
                };
                println!("  {:<40} {}", subject.name, count);
            }
        }

        TaxonomyAction::Topics { subject } => {
            let Some(found) = taxonomy.subject(&subject) else {
                anyhow::bail!("Subject not found: {}", subject);
            };
            println!("{} {}", "Subject".cyan().bold(), found.name.bold());
            println!("{}", "─".repeat(50));
            for topic in &found.topics {
                println!("  {}", topic);
            }
        }
    }

    Ok(())
}
