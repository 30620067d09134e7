//! Blocking resolution: can a task start now, and if not, who is in the way

use serde::Serialize;

use super::task::{index_by_id, Task};

/// Result of [`can_start`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCheck<'a> {
    /// True iff `blocked_by` is empty
    pub can_start: bool,
    /// Resolved dependencies that are not completed, in declaration order
    pub blocked_by: Vec<&'a Task>,
}

/// Determines whether `task` can start given the current snapshot
///
/// A dependency blocks while its status is anything but `completed`.
/// Unresolved dependency ids never block; [`validate`](super::validate)
/// reports them instead. Repeated ids are listed as often as declared.
pub fn can_start<'a>(task: &Task, all_tasks: &'a [Task]) -> StartCheck<'a> {
    if !task.has_dependencies() {
        return StartCheck {
            can_start: true,
            blocked_by: Vec::new(),
        };
    }

    let index = index_by_id(all_tasks);
    let blocked_by: Vec<&Task> = task
        .dependencies
        .iter()
        .filter_map(|dep_id| index.get(dep_id).copied())
        .filter(|dep| !dep.is_complete())
        .collect();

    StartCheck {
        can_start: blocked_by.is_empty(),
        blocked_by,
    }
}

/// Returns tasks that are not completed and have nothing blocking them
pub fn ready_tasks(all_tasks: &[Task]) -> Vec<&Task> {
    all_tasks
        .iter()
        .filter(|task| !task.is_complete())
        .filter(|task| can_start(task, all_tasks).can_start)
        .collect()
}

/// Returns tasks that are not completed but wait on at least one dependency,
/// each with its blockers
pub fn blocked_tasks(all_tasks: &[Task]) -> Vec<(&Task, Vec<&Task>)> {
    all_tasks
        .iter()
        .filter(|task| !task.is_complete())
        .filter_map(|task| {
            let check = can_start(task, all_tasks);
            (!check.can_start).then_some((task, check.blocked_by))
        })
        .collect()
}
