//! Savepoint - transparent per-save local file history.
//!
//! This binary is the thin adapter between a host (shell, editor hook,
//! file watcher) and the versioning engine: it parses options, builds the
//! engine, runs one operation, and presents failures without letting them
//! abort whatever triggered the save.

use std::path::PathBuf;

use anyhow::Context;
use chrono::DateTime;
use clap::{Parser, Subcommand};
use savepoint_core::{Engine, EngineConfig, RevisionRecord, Setting};
use savepoint_util::log::{self, LogConfig, LogLevel};
use savepoint_util::ordinal;

#[derive(Parser)]
#[command(name = "savepoint")]
#[command(author, version, about = "Transparent per-save local file history", long_about = None)]
struct Cli {
    /// Repository location (falls back to $SAVEPOINT_DIR)
    #[arg(long)]
    repo_dir: Option<PathBuf>,

    /// Regex excluding full paths (falls back to $SAVEPOINT_EXCLUDE_PATHS)
    #[arg(long)]
    exclude_paths: Option<String>,

    /// Regex excluding file names (falls back to $SAVEPOINT_EXCLUDE_FILES)
    #[arg(long)]
    exclude_files: Option<String>,

    /// Log directory (falls back to $SAVEPOINT_LOG_DIR; unset disables logging)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot a file into the history repository
    Commit {
        /// File to snapshot
        path: String,
    },
    /// List the captured revisions of a file
    Log {
        /// File to inspect
        path: String,
        /// Comma-separated metadata fields to include (git placeholder names)
        #[arg(long, default_value = "ad,s")]
        fields: String,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Materialize one revision into a temporary file
    Show {
        /// File to inspect
        path: String,
        /// Revision ordinal (0 = live copy, 1 = previous, ...)
        revision: i64,
        /// Print the revision content instead of the temp file path
        #[arg(long)]
        print: bool,
    },
    /// Revert a file to a prior revision
    Revert {
        /// File to revert
        path: String,
        /// Revision ordinal (1 = previous, ...)
        revision: i64,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| std::env::var("SAVEPOINT_LOG_DIR").ok().map(PathBuf::from));
    log::init(LogConfig {
        print: cli.verbose,
        level: if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        },
        dir: log_dir,
    });

    if let Err(e) = run(cli) {
        eprintln!("savepoint: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let engine = build_engine(&cli);

    match cli.command {
        Commands::Commit { path } => {
            engine
                .commit_file(&path)
                .with_context(|| format!("cannot snapshot {path}"))?;
        }
        Commands::Log { path, fields, json } => {
            let fields: Vec<String> = fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            let records = engine.revision_information(Some(&path), &fields)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("no history for {path}");
            } else {
                println!("{}", render_history(&records));
            }
        }
        Commands::Show {
            path,
            revision,
            print,
        } => match engine.checkout_file(Some(&path), revision)? {
            Some(tmp) => {
                if print {
                    let content = std::fs::read(&tmp)
                        .with_context(|| format!("cannot read {}", tmp.display()))?;
                    use std::io::Write;
                    std::io::stdout().write_all(&content)?;
                } else {
                    println!("{}", tmp.display());
                }
            }
            None => anyhow::bail!("no revision {revision} for {path}"),
        },
        Commands::Revert { path, revision } => {
            if engine.revert_file(Some(&path), revision)? {
                println!("reverted {path} to the {} prior commit", ordinal(revision as usize));
            } else {
                println!("nothing to revert for {path}");
            }
        }
    }

    Ok(())
}

/// Build the engine from flags, falling back to environment variables.
///
/// Flag values are fixed for the process; environment fallbacks are wired
/// as resolvers so a host that rewrites its environment mid-session is
/// picked up on the next call.
fn build_engine(cli: &Cli) -> Engine {
    let config = EngineConfig::new()
        .with_location(setting(
            cli.repo_dir.as_ref().map(|p| p.to_string_lossy().into_owned()),
            "SAVEPOINT_DIR",
        ))
        .with_exclude_paths(setting(cli.exclude_paths.clone(), "SAVEPOINT_EXCLUDE_PATHS"))
        .with_exclude_files(setting(cli.exclude_files.clone(), "SAVEPOINT_EXCLUDE_FILES"))
        .with_log(setting(
            cli.log_dir.as_ref().map(|p| p.to_string_lossy().into_owned()),
            "SAVEPOINT_LOG_DIR",
        ));
    Engine::new(config)
}

fn setting(flag: Option<String>, env_var: &'static str) -> Setting {
    match flag {
        Some(value) => Setting::value(value),
        None => Setting::resolver(move || std::env::var(env_var).ok()),
    }
}

/// Render history as an ordinal-labelled listing:
/// ```text
///  1 # previous         7 Jan 2008 Commit from Savepoint
///  2 # 2 versions ago  14 Jul 2007 Commit from Savepoint
/// ```
fn render_history(records: &[RevisionRecord]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let label = if idx == 0 {
                "previous".to_string()
            } else {
                format!("{} versions ago", idx + 1)
            };
            let date = record
                .get("ad")
                .and_then(|ad| DateTime::parse_from_rfc2822(ad).ok())
                .map(|dt| dt.format("%d %b %Y").to_string())
                .unwrap_or_default();
            let subject = record.get("s").unwrap_or("");
            format!("{:>2} # {:<15.15} {:>11.11} {}", idx + 1, label, date, subject)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
