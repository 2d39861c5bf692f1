//! Terminal front-end for the memo pad.
//!
//! # Responsibility
//! - Map each subcommand onto one `NoteSession` command handler.
//! - Report validation/format failures on stderr with a non-zero exit code.

mod args;

use args::{Cli, Commands};
use clap::Parser;
use log::info;
use memopad_core::{
    default_log_level, format_timestamp, init_logging, Note, NoteSession, SaveOutcome,
    SessionError, SqliteKvStore, SystemClock,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_DB_FILE_NAME: &str = "memopad.sqlite3";

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SessionError> {
    if let Commands::Ping = cli.command {
        println!("memopad_core ping={}", memopad_core::ping());
        println!("memopad_core version={}", memopad_core::core_version());
        return Ok(());
    }

    let db_path = cli.db.unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME));
    let store = SqliteKvStore::open(&db_path).map_err(memopad_core::RepoError::from)?;
    let mut session = NoteSession::open(store, SystemClock)?;
    info!(
        "event=cli_start module=cli status=ok db={}",
        db_path.display()
    );

    match cli.command {
        Commands::Ping => {}
        Commands::List(args) => {
            session.search(args.search);
            if args.important {
                session.toggle_filter();
            }
            let view = session.view();
            if view.items().is_empty() {
                println!("{}", session.empty_message());
            }
            for note in view.items() {
                print_summary(note);
            }
        }
        Commands::Add(args) => {
            session.set_important_mode(args.important);
            let outcome = session.save(&args.content)?;
            println!("saved note {}", outcome.note().id);
        }
        Commands::Edit(args) => {
            if session.open_detail(args.id).is_none() {
                return Err(memopad_core::RepoError::NotFound(args.id).into());
            }
            if args.star {
                session.set_important_mode(true);
            } else if args.unstar {
                session.set_important_mode(false);
            }
            if let SaveOutcome::Updated(note) = session.save(&args.content)? {
                println!("updated note {}", note.id);
            }
        }
        Commands::Show(args) => match session.repository().find_by_id(args.id) {
            Some(note) => {
                print_summary(note);
                println!();
                println!("{}", note.content);
            }
            None => return Err(memopad_core::RepoError::NotFound(args.id).into()),
        },
        Commands::Delete(args) => {
            if session.delete(args.id)? {
                println!("deleted note {}", args.id);
            } else {
                println!("no note with id {}", args.id);
            }
        }
        Commands::Export(args) => {
            let path = session.export_to_dir(&args.dir)?;
            println!(
                "exported {} note(s) to {}",
                session.repository().len(),
                path.display()
            );
        }
        Commands::Import(args) => {
            let pending = session.prepare_import_file(&args.file)?;
            let count = pending.added_count();
            if !args.yes && !confirm(&format!("Import {count} new note(s)?")) {
                println!("import cancelled");
                return Ok(());
            }
            let added = session.commit_import(pending)?;
            println!("imported {added} note(s)");
        }
    }

    Ok(())
}

fn print_summary(note: &Note) {
    let star = if note.is_important { "*" } else { " " };
    let first_line = note.content.lines().next().unwrap_or_default();
    println!(
        "{star} {:>14}  {}  {}",
        note.id,
        format_timestamp(note.last_modified),
        first_line
    );
}

fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
