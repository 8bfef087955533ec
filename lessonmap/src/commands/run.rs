//! Full course run.

use anyhow::Result;
use colored::Colorize;
use lessonmap_sdk::ReviewHook;
use lessonmap_sdk::pipeline::RunOutcome;

use crate::cli::RunArgs;
use crate::commands::{open_mapper, prepare, render_record, write_json};
use crate::config::Config;
use crate::review::PromptReview;
use crate::sources::{FileTitleSource, OverridesFile};

pub fn execute(args: RunArgs, config: &Config) -> Result<()> {
    config.ensure_dirs()?;

    let (mut mapper, mode) = open_mapper(config, &args.options)?;
    prepare(&mut mapper)?;

    let high_confidence = mapper.config().matcher.high_confidence;
    let mut source = FileTitleSource::new(&args.titles);

    let mut file_hook: OverridesFile;
    let mut prompt_hook: PromptReview;
    let review: Option<&mut dyn ReviewHook> = if let Some(path) = &args.overrides {
        file_hook = OverridesFile::new(path);
        Some(&mut file_hook)
    } else if args.review {
        prompt_hook = PromptReview::new(high_confidence, mapper.taxonomy().fallback().to_vec());
        Some(&mut prompt_hook)
    } else {
        None
    };

    let outcome = mapper.run(&args.course, &mut source, review, mode)?;

    report(&outcome, high_confidence);

    let tasks = &outcome.tasks;
    write_json(tasks, args.output.as_deref())?;
    if let Some(path) = &args.output {
        eprintln!(
            "{} Wrote {} task records to {}",
            "✓".green(),
            tasks.len(),
            path.display()
        );
    }

    Ok(())
}

/// Human summary on stderr so stdout stays a clean task list
fn report(outcome: &RunOutcome, high_confidence: f32) {
    eprintln!();
    eprintln!(
        "{} {}",
        "Course".cyan().bold(),
        outcome.course_id.bold()
    );
    eprintln!("{}", "─".repeat(50));

    if outcome.reused_memory {
        eprintln!("  {}", "Served from course memory".cyan());
    }
    for record in &outcome.records {
        eprintln!("{}", render_record(record, high_confidence));
    }

    let summary = &outcome.summary;
    eprintln!();
    eprintln!(
        "  {} mapped, {} unmapped of {} lessons",
        summary.mapped.to_string().green(),
        summary.unmapped.to_string().yellow(),
        summary.total
    );
    eprintln!(
        "  {} matched, {} from memory, {} overridden, {} failed",
        summary.matched, summary.from_cache, summary.overridden, summary.failed
    );

    let saved = if outcome.persisted {
        "✓ saved".green()
    } else {
        "○ not saved".yellow()
    };
    eprintln!(
        "  Memory: {}  ({} ms, run {})",
        saved,
        outcome.duration().num_milliseconds(),
        outcome.run_id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::MatchOptions;
    use crate::commands::testing;
    use lessonmap_sdk::memory::CourseMemory;
    use lessonmap_sdk::types::TaskRecord;
    use tempfile::tempdir;

    fn args(temp: &tempfile::TempDir, titles: &str) -> RunArgs {
        let titles_path = temp.path().join("titles.txt");
        std::fs::write(&titles_path, titles).unwrap();

        RunArgs {
            course: "https://bo.example.com/curso?id=77".into(),
            titles: titles_path,
            options: MatchOptions::default(),
            overrides: None,
            review: false,
            output: Some(temp.path().join("tasks.json")),
        }
    }

    fn read_tasks(temp: &tempfile::TempDir) -> Vec<TaskRecord> {
        let content = std::fs::read_to_string(temp.path().join("tasks.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn test_run_writes_tasks_and_memory() {
        let temp = tempdir().unwrap();
        let config = testing::config(&temp);

        execute(
            args(&temp, "Aula 01: Crimes contra a vida\nAula 02: Apresentação do Curso\n"),
            &config,
        )
        .unwrap();

        let tasks = read_tasks(&temp);
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].mapped);
        assert!(tasks[0].topics.contains(&"Crimes Contra a Vida".to_string()));
        assert!(!tasks[1].mapped);

        let mut memory = CourseMemory::open(config.paths.memory_path());
        assert_eq!(memory.last_accessed_course(), Some("77"));
        memory.select_course("77");
        assert_eq!(memory.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_run_with_overrides_file() {
        let temp = tempdir().unwrap();
        let config = testing::config(&temp);

        let overrides = temp.path().join("overrides.json");
        std::fs::write(&overrides, r#"{"Aula 02: Apresentação do Curso": ["Licitações"]}"#).unwrap();

        let mut run_args = args(&temp, "Aula 02: Apresentação do Curso\n");
        run_args.overrides = Some(overrides);
        execute(run_args, &config).unwrap();

        let tasks = read_tasks(&temp);
        assert_eq!(tasks, vec![TaskRecord::new("Aula 02: Apresentação do Curso", vec!["Licitações".into()])]);
    }

    #[test]
    fn test_run_empty_titles_file_fails() {
        let temp = tempdir().unwrap();
        let config = testing::config(&temp);

        assert!(execute(args(&temp, "# nothing yet\n"), &config).is_err());
        assert!(!temp.path().join("tasks.json").exists());
    }
}
