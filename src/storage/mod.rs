//! # Storage Layer
//!
//! Persistence for taskgraph. The engine in [`crate::domain`] never touches
//! files; everything here exists to hand it a fresh snapshot.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSONL (one JSON per line) | `.taskgraph/tasks.jsonl` |
//! | Config | TOML | `.taskgraph/config.toml` |
//! | Imported snapshots | JSON array or YAML list | any path via `--file` |
//!
//! ## Concurrency Safety
//!
//! - [`TaskStore`] uses file locking (`fs2`) for concurrent access
//! - Full rewrites are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a taskgraph project
//! - [`TaskStore`] - Read/write tasks as JSONL
//! - [`Config`] - Project and global configuration

mod jsonl;
mod config;
mod project;

pub use jsonl::{load_tasks, TaskStore};
pub use config::{
    Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, DEFAULT_TASKS_FILE, PROJECT_DIR,
};
pub use project::{Project, ProjectError};
