//! Ad-hoc title matching.

use anyhow::Result;
use colored::Colorize;

use crate::cli::MatchArgs;
use crate::commands::{open_mapper, prepare, render_record, write_json};
use crate::config::Config;

pub fn execute(args: MatchArgs, config: &Config) -> Result<()> {
    let (mut mapper, mode) = open_mapper(config, &args.options)?;
    prepare(&mut mapper)?;

    let records = mapper.match_titles(&args.titles, &mode)?;

    if args.json {
        return write_json(&records, None);
    }

    let high_confidence = mapper.config().matcher.high_confidence;
    println!("{}", "Matches".cyan().bold());
    println!("{}", "─".repeat(50));
    for record in &records {
        println!("{}", render_record(record, high_confidence));
    }

    let mapped = records.iter().filter(|r| r.mapped).count();
    println!();
    println!("  {} of {} titles mapped", mapped, records.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::MatchOptions;
    use crate::commands::testing;
    use lessonmap_sdk::memory::CourseMemory;
    use tempfile::tempdir;

    #[test]
    fn test_match_does_not_touch_memory() {
        let temp = tempdir().unwrap();
        let config = testing::config(&temp);

        let args = MatchArgs {
            titles: vec!["Licitações e contratos".into(), "Raio X da banca".into()],
            options: MatchOptions::default(),
            json: true,
        };
        execute(args, &config).unwrap();

        assert!(!config.paths.memory_path().exists());
        assert!(CourseMemory::open(config.paths.memory_path()).course_ids().is_empty());
    }

    #[test]
    fn test_match_missing_taxonomy() {
        let temp = tempdir().unwrap();
        let mut config = testing::config(&temp);
        config.paths.taxonomy = temp.path().join("absent.json");

        let args = MatchArgs {
            titles: vec!["Aula 01".into()],
            options: MatchOptions::default(),
            json: false,
        };
        assert!(execute(args, &config).is_err());
    }
}
