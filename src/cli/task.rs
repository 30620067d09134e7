//! Task CLI commands

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

use super::output::Output;
use super::source::{find, parse_date_arg, parse_id, TaskSource};
use crate::domain::{can_start, validate, validate_new_dependency, Task, TaskId, TaskStatus};

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Examples:
    ///   taskgraph task add "Design schema"
    ///   taskgraph task add "Build API" --id api --dep schema --start 2024-03-01 --due 2024-03-08
    Add {
        /// Task name
        name: String,

        /// Explicit task id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Initial status (pending, active, blocked, completed)
        #[arg(long, default_value = "pending")]
        status: TaskStatus,

        /// Start date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Task this one depends on (repeatable)
        #[arg(long = "dep")]
        deps: Vec<String>,
    },

    /// List tasks
    List,

    /// Show task details, blockers and validation
    Show {
        /// Task ID
        id: String,
    },

    /// Set task status
    Status {
        /// Task ID
        id: String,

        /// New status (pending, active, blocked, completed)
        status: TaskStatus,
    },

    /// Add a dependency between tasks
    Dep {
        /// Task that will be blocked
        task: String,

        /// Task that must be completed first
        depends_on: String,
    },

    /// Remove a dependency
    Undep {
        /// Task to unblock
        task: String,

        /// Dependency to remove
        depends_on: String,
    },

    /// Remove a task
    Remove {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, file: Option<&Path>, output: &Output) -> Result<()> {
    let source = TaskSource::resolve(file)?;

    match cmd {
        TaskCommands::Add {
            name,
            id,
            status,
            start,
            due,
            deps,
        } => {
            let new = NewTask {
                name,
                id,
                status,
                start,
                due,
                deps,
            };
            add_task(&source, output, new)
        }
        TaskCommands::List => list_tasks(&source, output),
        TaskCommands::Show { id } => show_task(&source, output, &id),
        TaskCommands::Status { id, status } => set_status(&source, output, &id, status),
        TaskCommands::Dep { task, depends_on } => add_dependency(&source, output, &task, &depends_on),
        TaskCommands::Undep { task, depends_on } => {
            remove_dependency(&source, output, &task, &depends_on)
        }
        TaskCommands::Remove { id } => remove_task(&source, output, &id),
    }
}

struct NewTask {
    name: String,
    id: Option<String>,
    status: TaskStatus,
    start: Option<String>,
    due: Option<String>,
    deps: Vec<String>,
}

fn add_task(source: &TaskSource, output: &Output, new: NewTask) -> Result<()> {
    let store = source.store()?;
    let mut tasks = store.read_all()?;

    if new.name.trim().is_empty() {
        anyhow::bail!("Task name must not be empty");
    }

    let task_id = match new.id.as_deref() {
        Some(raw) => parse_id(raw)?,
        None => TaskId::generate(&new.name, Utc::now()),
    };
    if tasks.iter().any(|t| t.id == task_id) {
        anyhow::bail!("Task already exists: {}", task_id);
    }

    let start = new.start.as_deref().map(parse_date_arg).transpose()?;
    let due = new.due.as_deref().map(parse_date_arg).transpose()?;
    let mut task = Task::new(task_id, new.name)
        .with_status(new.status)
        .with_dates(start, due);

    // Check each dependency against the snapshot the task will join
    tasks.push(task.clone());
    let mut warnings = Vec::new();
    for raw in &new.deps {
        let dep_id = parse_id(raw)?;
        let report = validate_new_dependency(&task, &dep_id, &tasks);
        if !report.valid {
            anyhow::bail!("Cannot add task: {}", report.errors.join("; "));
        }
        warnings.extend(report.warnings);
        task.add_dependency(dep_id);
    }

    store.append(&task)?;
    tracing::info!(id = %task.id, deps = task.dependencies.len(), "added task");

    for warning in &warnings {
        output.warning(warning);
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "warnings": warnings,
        }));
    } else {
        output.success(&format!("Created task: {} - {}", task.id, task.name));
    }

    Ok(())
}

fn list_tasks(source: &TaskSource, output: &Output) -> Result<()> {
    let tasks = source.load()?;

    if output.is_json() {
        output.data(&tasks);
    } else if tasks.is_empty() {
        println!("No tasks");
    } else {
        output.header(&format!("{:<20} {:<10} {:<30} DEPENDS ON", "ID", "STATUS", "NAME"), 80);

        for task in &tasks {
            let deps = task
                .dependencies
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("{:<20} {:<10} {:<30} {}", task.id, task.status, task.name, deps);
        }
    }

    Ok(())
}

fn show_task(source: &TaskSource, output: &Output, id_str: &str) -> Result<()> {
    let tasks = source.load()?;
    let id = parse_id(id_str)?;
    let task = find(&tasks, &id)?;

    let check = can_start(task, &tasks);
    let report = validate(task, &tasks);

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "canStart": check.can_start,
            "blockedBy": check.blocked_by.iter().map(|t| &t.id).collect::<Vec<_>>(),
            "validation": report,
        }));
        return Ok(());
    }

    println!("Task: {}", task.id);
    println!("Name: {}", task.name);
    println!("Status: {}", task.status);
    if let Some(start) = task.start_date {
        println!("Start: {}", start.format("%Y-%m-%d"));
    }
    if let Some(due) = task.due_date {
        println!("Due: {}", due.format("%Y-%m-%d"));
    }

    if task.has_dependencies() {
        println!("\nDepends on:");
        for dep in &task.dependencies {
            let dep_status = tasks
                .iter()
                .find(|t| &t.id == dep)
                .map(|t| t.status.label())
                .unwrap_or("missing");
            println!("  {} ({})", dep, dep_status);
        }
    }

    if !task.meta.is_empty() {
        println!("\nMetadata:");
        for (key, value) in task.meta.iter() {
            println!("  {}: {}", key, value);
        }
    }

    println!();
    if task.is_complete() {
        println!("Completed");
    } else if check.can_start {
        println!("READY (all dependencies complete)");
    } else {
        let blockers = check
            .blocked_by
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!("BLOCKED by {}", blockers);
    }

    for error in &report.errors {
        println!("  error: {}", error);
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    Ok(())
}

fn set_status(source: &TaskSource, output: &Output, id_str: &str, status: TaskStatus) -> Result<()> {
    let store = source.store()?;
    let id = parse_id(id_str)?;
    let tasks = store.read_all()?;

    let mut task = find(&tasks, &id)?.clone();
    task.status = status;

    // Starting work ahead of dependencies is allowed, but worth a warning
    let report = validate(&task, &tasks);
    for warning in &report.warnings {
        output.warning(warning);
    }

    store.update(&task)?;
    tracing::info!(id = %task.id, status = %task.status, "updated status");

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "status": task.status,
            "warnings": report.warnings,
        }));
    } else {
        output.success(&format!("{} is now {}", task.id, task.status));
    }

    Ok(())
}

fn add_dependency(
    source: &TaskSource,
    output: &Output,
    task_str: &str,
    depends_on_str: &str,
) -> Result<()> {
    let store = source.store()?;
    let task_id = parse_id(task_str)?;
    let depends_on_id = parse_id(depends_on_str)?;

    let tasks = store.read_all()?;
    let mut task = find(&tasks, &task_id)?.clone();

    let report = validate_new_dependency(&task, &depends_on_id, &tasks);
    if !report.valid {
        anyhow::bail!(
            "Refusing to add dependency {} -> {}: {}",
            task_id,
            depends_on_id,
            report.errors.join("; ")
        );
    }
    for warning in &report.warnings {
        output.warning(warning);
    }

    let added = task.add_dependency(depends_on_id.clone());
    if added {
        store.update(&task)?;
        tracing::info!(task = %task_id, depends_on = %depends_on_id, "added dependency");
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task_id,
            "dependsOn": depends_on_id,
            "added": added,
            "warnings": report.warnings,
        }));
    } else if added {
        output.success(&format!("{} now depends on {}", task_id, depends_on_id));
    } else {
        output.success(&format!("{} already depends on {}", task_id, depends_on_id));
    }

    Ok(())
}

fn remove_dependency(
    source: &TaskSource,
    output: &Output,
    task_str: &str,
    depends_on_str: &str,
) -> Result<()> {
    let store = source.store()?;
    let task_id = parse_id(task_str)?;
    let depends_on_id = parse_id(depends_on_str)?;

    let tasks = store.read_all()?;
    let mut task = find(&tasks, &task_id)?.clone();

    let removed = task.remove_dependency(&depends_on_id);
    if removed {
        store.update(&task)?;
    } else {
        tracing::debug!(task = %task_id, depends_on = %depends_on_id, "dependency not present");
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task_id,
            "removedDependency": depends_on_id,
            "removed": removed,
        }));
    } else if removed {
        output.success(&format!(
            "Removed dependency: {} no longer depends on {}",
            task_id, depends_on_id
        ));
    } else {
        output.success(&format!("{} did not depend on {}", task_id, depends_on_id));
    }

    Ok(())
}

fn remove_task(source: &TaskSource, output: &Output, id_str: &str) -> Result<()> {
    let store = source.store()?;
    let id = parse_id(id_str)?;

    if !store.remove(&id)? {
        anyhow::bail!("Task not found: {}", id);
    }

    // Dependents keep their reference; validation will report it as missing
    let dangling: Vec<TaskId> = store
        .read_all()?
        .into_iter()
        .filter(|t| t.dependencies.contains(&id))
        .map(|t| t.id)
        .collect();
    for dependent in &dangling {
        output.warning(&format!("{} still depends on removed task {}", dependent, id));
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "removed": id,
            "dependents": dangling,
        }));
    } else {
        output.success(&format!("Removed task: {}", id));
    }

    Ok(())
}
