//! Command-line front end for minivcs.
//!
//! Every command runs against the repository found by walking up from the
//! current directory. Failures print one line to stderr and exit non-zero.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use minivcs::{Error, MergeOutcome, Repository, Result};

/// Environment variable holding the log filter, e.g. `MINIVCS_LOG=debug`.
const LOG_ENV: &str = "MINIVCS_LOG";

#[derive(Parser, Debug)]
#[command(name = "minivcs", version, about = "A minimal version-control system")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a repository in the current directory.
    Init,
    /// Stage a file for the next commit.
    Add { file: String },
    /// Record the staged changes.
    Commit { message: String },
    /// Unstage a file, or stage its removal.
    Rm { file: String },
    /// Show the history of the current branch.
    Log,
    /// Show every commit ever made.
    GlobalLog,
    /// Print the ids of commits with the given message.
    Find { message: String },
    /// Show branches, staged changes and untracked files.
    Status,
    /// `checkout -- <file>`, `checkout <id> -- <file>` or `checkout <branch>`.
    Checkout {
        /// A branch name, or a commit id when a file follows.
        target: Option<String>,
        /// The file to restore.
        #[arg(last = true)]
        file: Option<String>,
    },
    /// Create a branch at HEAD.
    Branch { name: String },
    /// Delete a branch pointer.
    RmBranch { name: String },
    /// Move the current branch to a commit.
    Reset { id: String },
    /// Merge a branch into the current one.
    Merge { branch: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(command: Command) -> Result<()> {
    let cwd = std::env::current_dir()?;

    match command {
        Command::Init => {
            Repository::init(&cwd)?;
            Ok(())
        }
        command => dispatch(Repository::discover(&cwd)?, command),
    }
}

fn dispatch(mut repo: Repository, command: Command) -> Result<()> {
    match command {
        Command::Init => return Err(Error::AlreadyARepository(repo.path().to_path_buf())),
        Command::Add { file } => repo.add(&file)?,
        Command::Commit { message } => {
            repo.commit(&message)?;
        }
        Command::Rm { file } => repo.rm(&file)?,
        Command::Log => {
            for entry in repo.log()? {
                println!("{}", entry);
            }
        }
        Command::GlobalLog => {
            for entry in repo.global_log()? {
                println!("{}", entry);
            }
        }
        Command::Find { message } => {
            for oid in repo.find(&message)? {
                println!("{}", oid);
            }
        }
        Command::Status => print!("{}", repo.status()?),
        Command::Checkout { target, file } => match (target, file) {
            (None, Some(file)) => repo.checkout_file(&file)?,
            (Some(id), Some(file)) => repo.checkout_file_at(&id, &file)?,
            (Some(branch), None) => repo.checkout_branch(&branch)?,
            (None, None) => {
                return Err(Error::FileNotFound(
                    "checkout needs a branch or `-- <file>`".to_string(),
                ))
            }
        },
        Command::Branch { name } => repo.branch(&name)?,
        Command::RmBranch { name } => repo.rm_branch(&name)?,
        Command::Reset { id } => repo.reset(&id)?,
        Command::Merge { branch } => match repo.merge(&branch)? {
            MergeOutcome::FastForwarded => println!("Current branch fast-forwarded."),
            MergeOutcome::AlreadyUpToDate => {
                println!("Given branch is an ancestor of the current branch.")
            }
            MergeOutcome::Merged { conflicts, .. } => {
                if !conflicts.is_empty() {
                    println!("Encountered a merge conflict.");
                }
            }
        },
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
