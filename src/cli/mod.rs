//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Task | Task and dependency edits | `task add`, `task dep`, `task status` |
//! | Query | Engine reports | `validate`, `ready`, `blocked`, `order` |
//! | Schedule | Time analysis | `critical-path`, `gantt` |
//!
//! Queries read the project store, or any snapshot passed with `--file`.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Use `--verbose` (or `-v`) for debug logs on stderr:
//! ```bash
//! taskgraph --verbose critical-path
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod source;
mod task;
mod query;

pub use app::{run, Cli, Commands, LogLevel};
pub use output::{Output, OutputFormat};
