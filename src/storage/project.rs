//! Project management
//!
//! Handles project initialization and provides access to the task store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{Config, DEFAULT_TASKS_FILE, PROJECT_DIR};
use super::TaskStore;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a taskgraph project. Run 'taskgraph init' first.")]
    NotInProject,
}

/// A taskgraph project: a directory containing `.taskgraph/`
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Idempotent: existing config and task files are left untouched.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let project_dir = root.join(PROJECT_DIR);

        fs::create_dir_all(&project_dir).with_context(|| {
            format!(
                "Failed to create {} directory: {}",
                PROJECT_DIR,
                project_dir.display()
            )
        })?;

        // Create default config
        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = format!(
                r#"# taskgraph configuration

# Task store, relative to this directory (.jsonl, .json or .yaml)
tasks_file = "{}"

# Gantt chart geometry (pixels vertically, percent of window horizontally)
[gantt]
row_height = 40.0
bar_height = 24.0
header_height = 0.0
elbow_offset = 1.0
arrow_width = 0.6
arrow_height = 8.0
"#,
                DEFAULT_TASKS_FILE
            );
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let tasks_path = project_dir.join(DEFAULT_TASKS_FILE);
        if !tasks_path.exists() {
            fs::write(&tasks_path, "")
                .with_context(|| format!("Failed to create task store: {}", tasks_path.display()))?;
        }

        tracing::info!(root = %root.display(), "initialized project");
        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .taskgraph directory path
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the path of the configured task file
    pub fn tasks_path(&self) -> PathBuf {
        self.project_dir().join(&self.config.project.tasks_file)
    }

    /// Returns the JSONL task store
    pub fn task_store(&self) -> TaskStore {
        TaskStore::new(self.tasks_path())
    }
}
