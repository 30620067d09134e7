//! Where a command reads its task snapshot from

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::domain::{parse_date, RowLayout, Task, TaskId};
use crate::storage::{load_tasks, Project, TaskStore};

/// A task snapshot source: an explicit `--file`, or the current project
pub enum TaskSource {
    File(PathBuf),
    Project(Project),
}

impl TaskSource {
    /// Uses `file` when given, otherwise opens the project around the current directory
    pub fn resolve(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Ok(Self::File(path.to_path_buf())),
            None => Ok(Self::Project(Project::open_current()?)),
        }
    }

    /// Loads a fresh snapshot of every task
    pub fn load(&self) -> Result<Vec<Task>> {
        let tasks = match self {
            Self::File(path) => load_tasks(path)?,
            Self::Project(project) => project.task_store().read_all()?,
        };
        tracing::debug!(source = %self.describe(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    /// Gantt geometry: the project's configured layout, or the defaults
    pub fn layout(&self) -> RowLayout {
        match self {
            Self::File(_) => RowLayout::default(),
            Self::Project(project) => project.config().project.gantt.clone(),
        }
    }

    /// Returns the writable store, refusing read-only snapshots
    pub fn store(&self) -> Result<TaskStore> {
        match self {
            Self::File(path) => anyhow::bail!(
                "{} is a read-only snapshot; run task changes inside a taskgraph project",
                path.display()
            ),
            Self::Project(project) => Ok(project.task_store()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Project(project) => project.tasks_path().display().to_string(),
        }
    }
}

/// Parses a task id argument
pub fn parse_id(raw: &str) -> Result<TaskId> {
    raw.parse()
        .with_context(|| format!("Invalid task id: '{}'", raw))
}

/// Finds a task by id in a snapshot
pub fn find<'a>(tasks: &'a [Task], id: &TaskId) -> Result<&'a Task> {
    tasks
        .iter()
        .find(|task| &task.id == id)
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))
}

/// Parses a date argument (`YYYY-MM-DD` or RFC 3339)
pub fn parse_date_arg(raw: &str) -> Result<DateTime<Utc>> {
    parse_date(raw).ok_or_else(|| {
        anyhow::anyhow!("Invalid date: '{}' (expected YYYY-MM-DD or RFC 3339)", raw)
    })
}
