//! File storage for task snapshots
//!
//! The project store is `.taskgraph/tasks.jsonl` with one JSON task per line.
//! Uses file locking for concurrent access safety.
//!
//! [`load_tasks`] additionally reads exported snapshots: a JSON array
//! (`.json`) or a YAML list (`.yaml`/`.yml`).

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{Task, TaskId};

/// Store for task data in JSONL format
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    /// Creates a new task store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all tasks from the store, in file order
    ///
    /// A task written again later (an update appended as a new line)
    /// replaces the earlier line but keeps its position.
    pub fn read_all(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on task store")?;

        let reader = BufReader::new(&file);
        let mut tasks: Vec<Task> = Vec::new();
        let mut positions: HashMap<TaskId, usize> = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let task: Task = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse task at line {}", line_num + 1))?;

            match positions.get(&task.id) {
                Some(&pos) => tasks[pos] = task,
                None => {
                    positions.insert(task.id.clone(), tasks.len());
                    tasks.push(task);
                }
            }
        }

        tracing::debug!(path = %self.path.display(), count = tasks.len(), "read task store");

        // Lock is released when file is dropped
        Ok(tasks)
    }

    /// Writes all tasks to the store (full rewrite, order preserved)
    pub fn write_all(&self, tasks: &[Task]) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Write to temp file first
        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on task store")?;

            let mut writer = BufWriter::new(&file);

            for task in tasks {
                let line = serde_json::to_string(task).context("Failed to serialize task")?;
                writeln!(writer, "{}", line).context("Failed to write task")?;
            }

            writer.flush().context("Failed to flush task store")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        tracing::debug!(path = %self.path.display(), count = tasks.len(), "wrote task store");
        Ok(())
    }

    /// Appends a single task (used for quick adds without full rewrite)
    pub fn append(&self, task: &Task) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;

        // Acquire exclusive lock
        file.lock_exclusive()
            .context("Failed to acquire write lock on task store")?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(task).context("Failed to serialize task")?;
        writeln!(writer, "{}", line).context("Failed to write task")?;

        writer.flush().context("Failed to flush task store")?;

        Ok(())
    }

    /// Updates a single task in place, or appends it if the id is new
    pub fn update(&self, task: &Task) -> Result<()> {
        let mut tasks = self.read_all()?;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => tasks.push(task.clone()),
        }
        self.write_all(&tasks)
    }

    /// Removes a task by ID
    pub fn remove(&self, task_id: &TaskId) -> Result<bool> {
        let mut tasks = self.read_all()?;
        let len_before = tasks.len();
        tasks.retain(|t| &t.id != task_id);
        let removed = tasks.len() != len_before;
        if removed {
            self.write_all(&tasks)?;
        }
        Ok(removed)
    }
}

/// Loads a task snapshot from a file, choosing the format by extension
///
/// `.json` is a JSON array, `.yaml`/`.yml` a YAML list, anything else JSONL.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read task file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON task list: {}", path.display()))
        }
        Some("yaml") | Some("yml") => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read task file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML task list: {}", path.display()))
        }
        _ => {
            if !path.exists() {
                anyhow::bail!("Task file not found: {}", path.display());
            }
            TaskStore::new(path).read_all()
        }
    }
}
