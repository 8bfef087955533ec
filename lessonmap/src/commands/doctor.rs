//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;
use lessonmap_sdk::embeddings::model_dimensions;
use lessonmap_sdk::{EmbeddingBackend, IndexStatus, Mapper};

use crate::commands::taxonomy;
use crate::config::Config;

pub fn execute(config: &Config) -> Result<()> {
    println!("{}", "lessonmap Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check config file
    print!("  Config file: ");
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check data directory
    print!("  Data directory: ");
    if config.paths.data_dir.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ will be created".yellow());
    }

    // Check taxonomy
    print!("  Taxonomy: ");
    let taxonomy_ok = match taxonomy::load(config) {
        Ok(taxonomy) if taxonomy.is_empty() => {
            println!("{}", "✗ no subjects".red());
            issues.push("Taxonomy file has no subjects");
            false
        }
        Ok(taxonomy) => {
            println!(
                "{}",
                format!(
                    "✓ {} subjects, {} topics",
                    taxonomy.subjects().len(),
                    taxonomy.topic_count()
                )
                .green()
            );
            true
        }
        Err(e) => {
            println!("{}", format!("✗ {:#}", e).red());
            issues.push("Taxonomy cannot be loaded");
            false
        }
    };

    // Check memory file
    print!("  Course memory: ");
    let memory_path = config.paths.memory_path();
    if !memory_path.exists() {
        println!("{}", "○ not found (created on first run)".yellow());
    } else {
        match std::fs::read_to_string(&memory_path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str::<serde_json::Value>(&content)?))
        {
            Ok(_) => println!("{}", "✓ readable".green()),
            Err(e) => {
                println!("{}", format!("✗ {}", e).red());
                issues.push("Course memory is unreadable and will be replaced on the next save");
            }
        }
    }

    // Check embedding backend
    print!("  Embedding backend: ");
    match config.embedding.backend {
        EmbeddingBackend::Hashing => println!(
            "{}",
            format!("○ hashing ({} dims, offline)", config.embedding.hashing_dimensions).yellow()
        ),
        EmbeddingBackend::FastEmbed => match model_dimensions(&config.embedding.model) {
            Some(dims) => println!(
                "{}",
                format!("✓ fastembed {} ({} dims)", config.embedding.model, dims).green()
            ),
            None => {
                println!("{}", format!("✗ unknown model {}", config.embedding.model).red());
                issues.push("Configured embedding model is not supported");
            }
        },
    }

    // Check index freshness
    if taxonomy_ok {
        println!();
        println!("  {}", "Embedding index:".cyan());
        match Mapper::new(config.mapper_config(None)) {
            Ok(mapper) => {
                for (role, status) in mapper.index_status() {
                    print!("    {}: ", role.as_str());
                    match status {
                        IndexStatus::Fresh { records, .. } => {
                            println!("{}", format!("✓ fresh ({} vectors)", records).green())
                        }
                        IndexStatus::Missing => println!("{}", "○ missing (built on first run)".yellow()),
                        IndexStatus::Stale { reason } => {
                            println!("{}", format!("○ stale: {}", reason).yellow())
                        }
                        IndexStatus::Corrupt { reason } => {
                            println!("{}", format!("✗ corrupt: {}", reason).red());
                            issues.push("Embedding index file is corrupt; run `lessonmap index build --force`");
                        }
                    }
                }
            }
            Err(e) => {
                println!("    {}", format!("✗ {}", e).red());
                issues.push("Mapper cannot be initialized");
            }
        }
    }

    // Summary
    println!();
    if issues.is_empty() {
        println!("{}", "✓ Ready to map lessons".green().bold());
    } else {
        println!("{}", format!("✗ {} problem(s):", issues.len()).red().bold());
        for issue in issues {
            println!("  {} {}", "•".red(), issue);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use tempfile::tempdir;

    #[test]
    fn test_doctor_runs_with_broken_setup() {
        let temp = tempdir().unwrap();
        let mut config = testing::config(&temp);
        std::fs::create_dir_all(&config.paths.data_dir).unwrap();
        std::fs::write(config.paths.memory_path(), "{ not json").unwrap();
        execute(&config).unwrap();

        config.paths.taxonomy = temp.path().join("absent.json");
        execute(&config).unwrap();
    }
}
