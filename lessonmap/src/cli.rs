//! CLI argument definitions using clap derive macros.
//!
//! Command structure for course runs, ad-hoc matching and memory upkeep.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lessonmap_sdk::MatcherPreset;

/// Lesson title → taxonomy mapper
///
/// Matches course lesson titles onto a subject/topic taxonomy and keeps the
/// accepted topics per course across runs.
#[derive(Parser, Debug)]
#[command(name = "lessonmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map every lesson of a course and store the result
    Run(RunArgs),

    /// Match ad-hoc titles without touching course memory
    Match(MatchArgs),

    /// Embedding index management (build, status)
    Index(IndexCommand),

    /// Course memory (courses, show, set, forget, export, clear)
    Memory(MemoryCommand),

    /// Taxonomy inspection
    Taxonomy(TaxonomyCommand),

    /// Run diagnostics
    Doctor,

    /// Show version
    Version,
}

/// Matcher overrides shared by `run` and `match`
#[derive(Args, Debug, Clone, Default)]
pub struct MatchOptions {
    /// Only consider topics of these subjects (repeatable)
    #[arg(short, long = "focus", value_name = "SUBJECT")]
    pub focus: Vec<String>,

    /// Threshold preset (automatic, relaxed, focused)
    #[arg(short, long)]
    pub preset: Option<MatcherPreset>,

    /// Maximum candidates per tier
    #[arg(long)]
    pub top_k: Option<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Run / Match
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Course id or course URL containing `id=`
    #[arg(short, long)]
    pub course: String,

    /// File with lesson titles (one per line, or a JSON array)
    #[arg(short, long)]
    pub titles: PathBuf,

    #[command(flatten)]
    pub options: MatchOptions,

    /// JSON file mapping titles to topic lists; entries override the matcher
    #[arg(long, conflicts_with = "review")]
    pub overrides: Option<PathBuf>,

    /// Review and correct the results interactively before saving
    #[arg(long)]
    pub review: bool,

    /// Write the task records here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Lesson titles to match
    #[arg(required = true)]
    pub titles: Vec<String>,

    #[command(flatten)]
    pub options: MatchOptions,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Index Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Compute the embedding index for the current taxonomy
    Build {
        /// Discard existing index files first
        #[arg(short, long)]
        force: bool,
    },

    /// Show whether each index file matches the taxonomy and model
    Status,
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct MemoryCommand {
    #[command(subcommand)]
    pub action: MemoryAction,
}

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// List stored courses
    Courses,

    /// Show the stored topics of a course
    Show {
        /// Course id (defaults to the last accessed course)
        #[arg(short, long)]
        course: Option<String>,
    },

    /// Store topics for a lesson title
    Set {
        /// Course id
        #[arg(short, long)]
        course: String,

        /// Lesson title
        #[arg(short, long)]
        title: String,

        /// Topic (repeatable; none stores an empty list)
        #[arg(long = "topic", value_name = "TOPIC")]
        topics: Vec<String>,
    },

    /// Forget a lesson title so the next run matches it again
    Forget {
        /// Course id
        #[arg(short, long)]
        course: String,

        /// Lesson title
        #[arg(short, long)]
        title: String,
    },

    /// Export a course as task records
    Export {
        /// Course id
        #[arg(short, long)]
        course: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove every stored title of a course
    Clear {
        /// Course id
        #[arg(short, long)]
        course: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Taxonomy Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct TaxonomyCommand {
    #[command(subcommand)]
    pub action: TaxonomyAction,
}

#[derive(Subcommand, Debug)]
pub enum TaxonomyAction {
    /// Subject and topic counts
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List the topics of a subject
    Topics {
        /// Subject name
        subject: String,
    },
}
