//! # verx CLI - minimal local version control
//!
//! Command-line front end for the verx library.
//!
//! ## Usage
//! ```bash
//! # Initialize a repository in the current directory
//! verx init
//!
//! # Stage files and commit them
//! verx add README.md src/main.rs
//! verx commit -m "Initial commit"
//!
//! # Show history and what a commit changed
//! verx log
//! verx show <digest-or-prefix>
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use humantime::format_duration;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use verx::{
    utils, CommitDiff, DiffKind, DiffOptions, FileChange, Repository, RepositoryBuilder, VerxError,
};

/// verx CLI - stage, commit and diff files in a local repository
#[derive(Parser)]
#[command(name = "verx")]
#[command(version)]
#[command(about = "Minimal local version control: stage, commit, log and diff")]
#[command(long_about = None)]
struct Cli {
    /// Path to the worktree (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a repository
    Init {
        /// Allow commits with nothing staged
        #[arg(long)]
        allow_empty: bool,
    },

    /// Stage files for the next commit
    Add {
        /// Files to stage (relative paths resolve against the worktree)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Commit staged files
    #[command(alias = "ci")]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show commit history, newest first
    Log {
        /// Limit results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show what a commit changed relative to its parent
    Show {
        /// Commit digest or unique prefix
        commit: String,

        /// Ignore whitespace changes
        #[arg(long)]
        ignore_whitespace: bool,
    },

    /// Show HEAD, staged files and storage usage
    Status,

    /// Print the raw content of a stored object
    CatFile {
        /// Object digest or unique prefix
        object: String,
    },

    /// Verify every commit and blob reachable from HEAD
    Verify,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // Run command
    if let Err(e) = run(cli) {
        let message = match e.downcast_ref::<VerxError>() {
            Some(verx_error) => verx_error.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{}: {}", "Error".red().bold(), message);
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> anyhow::Result<()> {
    let worktree = cli.path.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Init { allow_empty } => cmd_init(worktree, allow_empty),
        Commands::Add { paths } => cmd_add(worktree, paths),
        Commands::Commit { message } => cmd_commit(worktree, message),
        Commands::Log { limit } => cmd_log(worktree, limit),
        Commands::Show {
            commit,
            ignore_whitespace,
        } => cmd_show(worktree, commit, ignore_whitespace),
        Commands::Status => cmd_status(worktree),
        Commands::CatFile { object } => cmd_cat_file(worktree, object),
        Commands::Verify => cmd_verify(worktree),
    }
}

/// Initialize a repository
///
/// An existing repository is reported and left alone.
fn cmd_init(worktree: PathBuf, allow_empty: bool) -> anyhow::Result<()> {
    if Repository::is_initialized(&worktree) {
        println!(
            "{} Repository already initialized at {}",
            "•".yellow().bold(),
            worktree.join(verx::repository::REPO_DIR_NAME).display().to_string().cyan()
        );
        return Ok(());
    }

    let repo = RepositoryBuilder::new()
        .allow_empty_commits(allow_empty)
        .build(&worktree)
        .with_context(|| format!("failed to initialize repository in {}", worktree.display()))?;

    println!("{} Initialized verx repository", "✓".green().bold());
    println!("  Worktree: {}", repo.worktree().display().to_string().cyan());
    println!("  Storage: {}", repo.repo_dir().display().to_string().cyan());
    println!("\nNext steps:");
    println!("  - Stage a file: {}", "verx add <path>".yellow());
    println!("  - Commit it: {}", "verx commit -m \"Initial commit\"".yellow());

    Ok(())
}

/// Stage files
fn cmd_add(worktree: PathBuf, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let mut repo = open_repository(&worktree)?;

    for path in &paths {
        let entry = repo
            .add(path)
            .with_context(|| format!("failed to add {}", path.display()))?;
        println!("{} {} {}", "+".green(), entry.path, entry.hash.short().dimmed());
    }

    Ok(())
}

/// Commit staged files
fn cmd_commit(worktree: PathBuf, message: String) -> anyhow::Result<()> {
    let mut repo = open_repository(&worktree)?;

    let start = Instant::now();
    let digest = repo.commit(&message)?;
    let commit = repo.resolve_commit(&digest)?;

    println!("{} Created commit {}", "✓".green().bold(), digest.short().yellow().bold());
    println!("  Message: {}", commit.summary().cyan());
    println!("  Files: {}", commit.files.len().to_string().cyan());
    println!("  Time: {}", format_duration(start.elapsed()).to_string().cyan());

    Ok(())
}

/// Show history
fn cmd_log(worktree: PathBuf, limit: Option<usize>) -> anyhow::Result<()> {
    let repo = open_repository(&worktree)?;
    let head = repo.current_head();

    let mut shown = 0;
    for entry in repo.history().take(limit.unwrap_or(usize::MAX)) {
        let (digest, commit) = entry.context("history walk failed")?;

        let marker = if head.as_ref() == Some(&digest) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!(
            "{} {} {} {}",
            marker,
            digest.short().yellow(),
            commit.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            commit.summary()
        );
        shown += 1;
    }

    if shown == 0 {
        println!("{}", "No commits yet".dimmed());
    }

    Ok(())
}

/// Show a commit and its diff against its parent
fn cmd_show(worktree: PathBuf, commit: String, ignore_whitespace: bool) -> anyhow::Result<()> {
    let repo = open_repository(&worktree)?;
    let digest = repo.resolve(&commit)?;

    let options = DiffOptions { ignore_whitespace };
    let diff = repo
        .show_commit_diff_with(&digest, &options)
        .with_context(|| format!("failed to show commit {}", digest.short()))?;

    print_commit_diff(&diff);
    Ok(())
}

fn print_commit_diff(diff: &CommitDiff) {
    println!("{} {}", "commit".yellow(), diff.digest.as_str().yellow());
    if let Some(parent) = &diff.commit.parent {
        println!("Parent: {}", parent.short().dimmed());
    }
    println!("Date:   {}", diff.commit.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("\n    {}\n", diff.commit.message);

    if diff.is_initial() {
        println!("{}", "Initial commit, nothing to compare against".dimmed());
        for file in &diff.files {
            println!("  {} {}", "+".green(), file.path.green());
        }
        return;
    }

    for file in &diff.files {
        match &file.change {
            FileChange::Initial => {}
            FileChange::New => {
                println!("{} {}", "new file:".green().bold(), file.path.cyan());
            }
            FileChange::Binary => {
                println!("{} {}", "binary file changed:".yellow(), file.path.cyan());
            }
            FileChange::Modified { parts, stats } => {
                println!(
                    "{} {} ({}, {})",
                    "modified:".bold(),
                    file.path.cyan(),
                    format!("+{}", stats.lines_added).green(),
                    format!("-{}", stats.lines_removed).red()
                );
                for part in parts {
                    for line in &part.lines {
                        match part.kind {
                            DiffKind::Added => println!("{}{}", "+".green(), line.green()),
                            DiffKind::Removed => println!("{}{}", "-".red(), line.red()),
                            DiffKind::Unchanged => println!(" {}", line.dimmed()),
                        }
                    }
                }
            }
        }
        println!();
    }

    let total = diff.total_stats();
    if total.has_changes() {
        println!(
            "{} lines added, {} lines removed",
            total.lines_added.to_string().green(),
            total.lines_removed.to_string().red()
        );
    }
}

/// Show current status
fn cmd_status(worktree: PathBuf) -> anyhow::Result<()> {
    let repo = open_repository(&worktree)?;

    println!("{}", "verx status:".blue().bold());
    println!();

    match repo.current_head() {
        Some(head) => {
            let commit = repo.resolve_commit(&head)?;
            println!("{}", "HEAD:".bold());
            println!("  Commit: {}", head.short().yellow());
            println!("  Created: {}", commit.timestamp.format("%Y-%m-%d %H:%M:%S"));
            println!("  Message: {}", commit.summary().cyan());
        }
        None => println!("{}", "No commits yet".dimmed()),
    }

    let staged = repo.staged()?;
    println!("\n{}", "Staged:".bold());
    if staged.is_empty() {
        println!("  {}", "nothing staged".dimmed());
    }
    for entry in &staged {
        println!("  {} {}", entry.path.green(), entry.hash.short().dimmed());
    }

    let stats = repo.stats()?;
    println!("\n{}", "Storage:".bold());
    println!("  Objects: {}", stats.object_count);
    println!("  Size: {}", utils::format_bytes(stats.total_size));

    Ok(())
}

/// Print a stored object
fn cmd_cat_file(worktree: PathBuf, object: String) -> anyhow::Result<()> {
    use std::io::Write;

    let repo = open_repository(&worktree)?;
    let digest = repo.resolve(&object)?;
    let content = repo.cat_object(&digest)?;

    std::io::stdout()
        .write_all(&content)
        .context("failed to write object to stdout")?;
    Ok(())
}

/// Verify repository integrity
fn cmd_verify(worktree: PathBuf) -> anyhow::Result<()> {
    let repo = open_repository(&worktree)?;

    println!("{}", "Verifying repository...".blue().bold());
    let report = repo.verify()?;

    if report.is_valid() {
        println!("{} {}", "✓".green().bold(), report.summary());
    } else {
        println!("{} {}", "✗".red().bold(), report.summary());
        for error in &report.errors {
            println!("  - {}", error.red());
        }
    }
    if report.unreachable_objects > 0 {
        println!(
            "  {}",
            format!("{} objects not reachable from HEAD", report.unreachable_objects).dimmed()
        );
    }

    if !report.is_valid() {
        anyhow::bail!("verification found {} problems", report.errors.len());
    }
    Ok(())
}

// Helper functions

/// Open the repository in `worktree`
fn open_repository(worktree: &Path) -> anyhow::Result<Repository> {
    Ok(Repository::open(worktree)?)
}
