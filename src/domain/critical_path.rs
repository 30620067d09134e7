//! Critical path analysis (CPM) over a task snapshot
//!
//! Forward pass for earliest starts, backward pass for latest starts, slack
//! as their difference. Times are [`ScheduleOffset`]s: whole days from an
//! implicit project start of zero.
//!
//! The calculator refuses cyclic input with [`ScheduleError::Cycle`] instead
//! of recursing forever, so callers may pass unvalidated snapshots.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use super::graph::{DependencyGraph, GraphError};
use super::id::TaskId;
use super::ordering::try_topological_order;
use super::schedule::{is_critical, task_duration, ScheduleOffset};
use super::task::Task;

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("Cannot schedule tasks with circular dependencies: {}", format_cycles(.0))]
    Cycle(Vec<Vec<TaskId>>),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn format_cycles(cycles: &[Vec<TaskId>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            let ids: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
            format!("[{}]", ids.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Schedule figures for one task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: String,
    pub earliest_start: ScheduleOffset,
    pub latest_start: ScheduleOffset,
    /// Days
    pub duration: i64,
    /// `latest_start - earliest_start`, in days
    pub slack: i64,
}

impl TaskInfo {
    /// Earliest day the task can be finished
    pub fn earliest_finish(&self) -> ScheduleOffset {
        self.earliest_start + self.duration
    }

    /// Latest day the task can finish without delaying the project
    pub fn latest_finish(&self) -> ScheduleOffset {
        self.latest_start + self.duration
    }

    pub fn is_critical(&self) -> bool {
        is_critical(self.slack)
    }
}

/// Result of [`calculate_critical_path`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathReport {
    /// Zero-slack tasks in dependency order
    pub critical_path: Vec<TaskInfo>,
    /// Days from project start to the last finish
    pub project_duration: i64,
    /// Every task, in input order
    pub task_details: Vec<TaskInfo>,
}

impl CriticalPathReport {
    /// Looks up the figures for one task
    pub fn task(&self, id: &TaskId) -> Option<&TaskInfo> {
        self.task_details.iter().find(|info| &info.id == id)
    }
}

/// Computes earliest/latest starts, slack and the critical path
///
/// - duration: see [`task_duration`]
/// - earliest start: 0 without dependencies, else the latest earliest-finish
///   among resolved dependencies
/// - project duration: the latest earliest-finish overall
/// - latest start: `project_duration - duration` without dependents, else the
///   smallest dependent latest start minus own duration
///
/// Dangling dependency ids are not edges. Repeated ids are rejected as
/// [`GraphError::DuplicateTask`].
pub fn calculate_critical_path(tasks: &[Task]) -> Result<CriticalPathReport, ScheduleError> {
    let graph = DependencyGraph::from_tasks(tasks)?;
    if graph.is_cyclic() {
        return Err(ScheduleError::Cycle(graph.cycles()));
    }
    let order = try_topological_order(tasks).map_err(|_| ScheduleError::Cycle(graph.cycles()))?;

    let durations: HashMap<&TaskId, i64> = tasks
        .iter()
        .map(|task| (&task.id, task_duration(task)))
        .collect();

    // Forward pass
    let mut earliest: HashMap<&TaskId, ScheduleOffset> = HashMap::with_capacity(tasks.len());
    for task in &order {
        let start = task
            .dependencies
            .iter()
            .filter_map(|dep_id| earliest.get(dep_id).map(|&es| es + durations[dep_id]))
            .max()
            .unwrap_or(ScheduleOffset::ZERO);
        earliest.insert(&task.id, start);
    }

    let project_duration = order
        .iter()
        .map(|task| (earliest[&task.id] + durations[&task.id]).days())
        .max()
        .unwrap_or(0);

    // Backward pass
    let mut latest: HashMap<&TaskId, ScheduleOffset> = HashMap::with_capacity(tasks.len());
    for task in order.iter().rev() {
        let duration = durations[&task.id];
        let start = graph
            .dependents(&task.id)?
            .iter()
            .filter_map(|dependent| latest.get(dependent).copied())
            .min()
            .map(|min| min - duration)
            .unwrap_or_else(|| ScheduleOffset::new(project_duration - duration));
        latest.insert(&task.id, start);
    }

    let info = |task: &Task| {
        let earliest_start = earliest[&task.id];
        let latest_start = latest[&task.id];
        TaskInfo {
            id: task.id.clone(),
            name: task.name.clone(),
            earliest_start,
            latest_start,
            duration: durations[&task.id],
            slack: latest_start - earliest_start,
        }
    };

    let task_details: Vec<TaskInfo> = tasks.iter().map(info).collect();
    let critical_path: Vec<TaskInfo> = order
        .iter()
        .map(|&task| info(task))
        .filter(TaskInfo::is_critical)
        .collect();

    tracing::debug!(
        tasks = tasks.len(),
        edges = graph.edge_count(),
        project_duration,
        critical = critical_path.len(),
        "critical path computed"
    );

    Ok(CriticalPathReport {
        critical_path,
        project_duration,
        task_details,
    })
}
