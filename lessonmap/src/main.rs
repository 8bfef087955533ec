//! lessonmap - Lesson title → taxonomy mapping CLI
//!
//! Reads the lesson titles of a course, matches them onto the subject/topic
//! taxonomy and remembers the accepted topics per course.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod config;
mod review;
mod sources;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let filter = EnvFilter::from_default_env().add_directive("lessonmap=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    // Load configuration
    let config = config::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &config),
        Commands::Match(args) => commands::matching::execute(args, &config),
        Commands::Index(cmd) => commands::index::execute(cmd, &config),
        Commands::Memory(cmd) => commands::memory::execute(cmd, &config),
        Commands::Taxonomy(cmd) => commands::taxonomy::execute(cmd, &config),
        Commands::Doctor => commands::doctor::execute(&config),
        Commands::Version => {
            println!("lessonmap {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
