//! Main CLI application structure

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use super::output::{Output, OutputFormat};
use super::source::TaskSource;
use super::{query, task};
use crate::logging::init_logging;
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "taskgraph")]
#[command(author, version, about = "Dependency analysis for task lists: validation, ordering, critical path and Gantt geometry")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Log level (overrides --verbose and TASKGRAPH_LOG)
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Read tasks from a snapshot file (.jsonl, .json or .yaml) instead of the project
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log verbosity accepted by `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskgraph project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Check dependencies of one task or all tasks (exit 1 on errors)
    Validate {
        /// Task ID (omit for all tasks)
        id: Option<String>,
    },

    /// Show tasks ready to work on
    Ready,

    /// Show blocked tasks
    Blocked,

    /// Show tasks in dependency order
    Order,

    /// Compute the critical path and per-task slack
    CriticalPath {
        /// Project start date, to print calendar dates (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
    },

    /// Compute Gantt bars and dependency arrows
    Gantt {
        /// Window start (defaults to the earliest task date)
        #[arg(long)]
        from: Option<String>,

        /// Window end (defaults to the latest task date)
        #[arg(long)]
        to: Option<String>,

        /// Lay tasks out by their critical-path schedule from --from (default today)
        #[arg(long)]
        schedule: bool,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.verbose)?;

    let format = match cli.format {
        Some(format) => format,
        None => Config::load()?.global.default_format,
    };
    let output = Output::new(format);
    let file = cli.file.as_deref();

    tracing::debug!(file = ?file, "taskgraph starting");

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            output.success(&format!(
                "Initialized taskgraph project at {}",
                project.root().display()
            ));
        }

        Commands::Task(cmd) => task::run(cmd, file, &output)?,

        Commands::Validate { id } => {
            let source = TaskSource::resolve(file)?;
            if !query::validate_tasks(&source, &output, id.as_deref())? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Ready => query::ready(&TaskSource::resolve(file)?, &output)?,
        Commands::Blocked => query::blocked(&TaskSource::resolve(file)?, &output)?,
        Commands::Order => query::order(&TaskSource::resolve(file)?, &output)?,
        Commands::CriticalPath { start } => {
            query::critical_path(&TaskSource::resolve(file)?, &output, start.as_deref())?
        }
        Commands::Gantt { from, to, schedule } => query::gantt(
            &TaskSource::resolve(file)?,
            &output,
            from.as_deref(),
            to.as_deref(),
            schedule,
        )?,
    }

    tracing::debug!("command completed");
    Ok(ExitCode::SUCCESS)
}
