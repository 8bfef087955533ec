//! Embedding index commands.

use anyhow::{Context, Result};
use colored::Colorize;
use lessonmap_sdk::{IndexStatus, Mapper};

use crate::cli::{IndexAction, IndexCommand, MatchOptions};
use crate::commands::{open_mapper, spinner};
use crate::config::Config;

pub fn execute(cmd: IndexCommand, config: &Config) -> Result<()> {
    let (mut mapper, _) = open_mapper(config, &MatchOptions::default())?;

    match cmd.action {
        IndexAction::Build { force } => {
            config.ensure_dirs()?;

            let pb = spinner(if force {
                "Rebuilding embedding index"
            } else {
                "Building embedding index"
            });
            let result = if force { mapper.rebuild_index() } else { mapper.prepare() };
            pb.finish_and_clear();
            result.context("Failed to build embedding index")?;

            println!("{} Embedding index ready", "✓".green());
            print_status(&mapper);
        }

        IndexAction::Status => {
            print_status(&mapper);
        }
    }

    Ok(())
}

fn print_status(mapper: &Mapper) {
    let embedding = &mapper.config().embedding;
    println!("{}", "Embedding Index".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("  Backend: {}", embedding.backend);
    println!("  Model:   {}", mapper.matcher().embedder().model_id());
    println!("  Dir:     {}", embedding.cache_dir.display());
    println!();

    for (role, status) in mapper.index_status() {
        print!("  {:<10} ", role.as_str());
        match status {
            IndexStatus::Fresh { records, created_at } => println!(
                "{} ({} vectors, built {})",
                "✓ fresh".green(),
                records,
                created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            ),
            IndexStatus::Missing => println!("{}", "○ missing".yellow()),
            IndexStatus::Stale { reason } => println!("{}", format!("○ stale: {}", reason).yellow()),
            IndexStatus::Corrupt { reason } => println!("{}", format!("✗ corrupt: {}", reason).red()),
        }
    }
}
