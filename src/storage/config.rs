//! Configuration handling for taskgraph
//!
//! Configuration is stored in `.taskgraph/config.toml` (project) and
//! `~/.config/taskgraph/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::RowLayout;

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".taskgraph";

/// Default store file name inside [`PROJECT_DIR`]
pub const DEFAULT_TASKS_FILE: &str = "tasks.jsonl";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Project-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Task store file, relative to the `.taskgraph` directory
    pub tasks_file: String,

    /// Gantt chart geometry
    pub gantt: RowLayout,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            tasks_file: DEFAULT_TASKS_FILE.to_string(),
            gantt: RowLayout::default(),
        }
    }
}

impl ProjectConfig {
    /// Checks values that parse but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks_file.trim().is_empty() {
            return Err(ConfigError::Invalid("tasks_file must not be empty".into()));
        }

        let gantt = &self.gantt;
        if gantt.row_height <= 0.0 || gantt.bar_height <= 0.0 {
            return Err(ConfigError::Invalid(
                "gantt.row_height and gantt.bar_height must be positive".into(),
            ));
        }
        if gantt.bar_height > gantt.row_height {
            return Err(ConfigError::Invalid(
                "gantt.bar_height must not exceed gantt.row_height".into(),
            ));
        }
        let sizes = [
            gantt.header_height,
            gantt.elbow_offset,
            gantt.arrow_width,
            gantt.arrow_height,
        ];
        if sizes.iter().any(|size| *size < 0.0) {
            return Err(ConfigError::Invalid("gantt sizes must not be negative".into()));
        }

        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "taskgraph", "taskgraph").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        match Self::find_project_root() {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for a `.taskgraph/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns true if we're in a taskgraph project
    pub fn is_in_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Returns the project root, or an error if not in a project
    pub fn require_project_root(&self) -> Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a taskgraph project. Run 'taskgraph init' first."))
    }

    /// Saves the project configuration
    pub fn save_project(&self) -> Result<()> {
        let root = self.require_project_root()?;
        let config_path = root.join(PROJECT_DIR).join("config.toml");

        let content =
            toml::to_string_pretty(&self.project).context("Failed to serialize project config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write project config: {}", config_path.display()))
    }
}
