//! Course memory commands.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use dialoguer::Confirm;
use lessonmap_sdk::memory::{CourseMemory, MemoryOptions};
use lessonmap_sdk::pipeline::parse_course_id;

use crate::cli::{MemoryAction, MemoryCommand};
use crate::commands::write_json;
use crate::config::Config;

fn open(config: &Config) -> CourseMemory {
    let options = MemoryOptions {
        legacy_course_id: config.memory.legacy_course_id.clone(),
    };
    CourseMemory::open_with(config.paths.memory_path(), &options)
}

fn course_id(input: &str) -> Result<String> {
    parse_course_id(input).with_context(|| format!("Invalid course id: {}", input))
}

pub fn execute(cmd: MemoryCommand, config: &Config) -> Result<()> {
    let mut memory = open(config);

    match cmd.action {
        MemoryAction::Courses => {
            let last = memory.last_accessed_course().map(String::from);
            let courses = memory.course_ids();
            if courses.is_empty() {
                println!("{}", "No courses in memory".yellow());
                return Ok(());
            }

            println!("{}", "Courses".cyan().bold());
            println!("{}", "─".repeat(50));
            for id in courses {
                let marker = if last.as_deref() == Some(id) { "*".green() } else { " ".normal() };
                println!("  {} {:<20} {} titles", marker, id, memory.course_len(id));
            }
        }

        MemoryAction::Show { course } => {
            let id = match course {
                Some(course) => course_id(&course)?,
                None => match memory.last_accessed_course() {
                    Some(id) => id.to_string(),
                    None => bail!("No course in memory; pass --course"),
                },
            };
            if !memory.course_ids().contains(&id.as_str()) {
                println!("{} {}", "○ No entries for course".yellow(), id);
                return Ok(());
            }

            memory.select_course(&id);
            println!("{} {}", "Course".cyan().bold(), id.bold());
            println!("{}", "─".repeat(50));
            for task in memory.export_tasks()? {
                if task.topics.is_empty() {
                    println!("  {} {}", "○".yellow(), task.title);
                } else {
                    println!("  {} {}", "✓".green(), task.title);
                    println!("      {}", task.topics.join(", ").dimmed());
                }
            }
        }

        MemoryAction::Set { course, title, topics } => {
            memory.select_course(course_id(&course)?);
            let title = title.trim().to_string();
            if title.is_empty() {
                bail!("Title must not be empty");
            }
            memory.set(title.clone(), topics)?;
            memory.persist().context("Failed to save course memory")?;
            println!("{} Stored topics for {}", "✓".green(), title.bold());
        }

        MemoryAction::Forget { course, title } => {
            memory.select_course(course_id(&course)?);
            if memory.remove(title.trim())? {
                memory.persist().context("Failed to save course memory")?;
                println!("{} Forgot {}", "✓".green(), title.bold());
            } else {
                println!("{} {} is not in memory", "○".yellow(), title);
            }
        }

        MemoryAction::Export { course, output } => {
            let id = course_id(&course)?;
            if !memory.course_ids().contains(&id.as_str()) {
                tracing::warn!(course = %id, "Course not in memory, exporting nothing");
            }
            memory.select_course(id);
            let tasks = memory.export_tasks()?;
            write_json(&tasks, output.as_deref())?;
            if let Some(path) = output {
                println!("{} Exported {} records to {}", "✓".green(), tasks.len(), path.display());
            }
        }

        MemoryAction::Clear { course, yes } => {
            let id = course_id(&course)?;
            let count = memory.course_len(&id);
            if count == 0 {
                println!("{} Nothing stored for {}", "○".yellow(), id);
                return Ok(());
            }

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Remove {} stored titles of course {}?", count, id))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled");
                    return Ok(());
                }
            }

            memory.select_course(&id);
            let removed = memory.clear_course()?;
            memory.persist().context("Failed to save course memory")?;
            println!("{} Removed {} titles from {}", "✓".green(), removed, id);
        }
    }

    Ok(())
}
