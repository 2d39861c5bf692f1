//! Command-line argument structures.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "memopad")]
#[command(about = "Local memo pad: write, star, search and back up notes", long_about = None)]
#[command(version = memopad_core::core_version())]
pub struct Cli {
    /// SQLite database holding the notes
    #[arg(long, global = true, env = "MEMOPAD_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print core linkage info
    Ping,

    /// List notes, optionally narrowed by search term and star filter
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a new note at the top of the list
    Add(AddArgs),

    /// Replace the content of an existing note in place
    Edit(EditArgs),

    /// Show one note
    Show(IdArgs),

    /// Delete a note (missing ids are ignored)
    #[command(alias = "rm")]
    Delete(IdArgs),

    /// Write a timestamped JSON backup of every note
    Export(ExportArgs),

    /// Merge notes from a JSON backup; existing ids are kept
    Import(ImportArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Case-insensitive substring to search for
    #[arg(long, short, default_value = "")]
    pub search: String,

    /// Only show starred notes
    #[arg(long, short)]
    pub important: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Note content
    pub content: String,

    /// Star the note
    #[arg(long, short)]
    pub important: bool,
}

#[derive(Args)]
pub struct EditArgs {
    /// Note id
    pub id: i64,

    /// New content
    pub content: String,

    /// Star the note
    #[arg(long, conflicts_with = "unstar")]
    pub star: bool,

    /// Remove the star
    #[arg(long)]
    pub unstar: bool,
}

#[derive(Args)]
pub struct IdArgs {
    /// Note id
    pub id: i64,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Directory to write the backup into
    #[arg(long, short, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Backup file (must end in .json)
    pub file: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}
