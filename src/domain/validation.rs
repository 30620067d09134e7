//! Dependency validation for one task
//!
//! Errors block (the dependency cannot stand); warnings are advisories shown
//! next to the task. Messages are meant for direct display.

use std::collections::HashMap;

use serde::Serialize;

use super::cycle::has_cycle_indexed;
use super::id::TaskId;
use super::task::{index_by_id, Task};

/// Outcome of validating a task's dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True iff `errors` is empty
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Returns true if there is nothing to report at all
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Validates every declared dependency of `task` against `all_tasks`
pub fn validate(task: &Task, all_tasks: &[Task]) -> ValidationReport {
    let index = index_by_id(all_tasks);
    validate_indexed(task, &index)
}

/// Validates every task in the set
pub fn validate_all(all_tasks: &[Task]) -> Vec<(&Task, ValidationReport)> {
    let index = index_by_id(all_tasks);
    all_tasks
        .iter()
        .map(|task| (task, validate_indexed(task, &index)))
        .collect()
}

/// Validates a dependency before it is added to `task`
///
/// Runs the same checks as [`validate`] for `candidate` alone, and warns
/// when the dependency is already declared.
pub fn validate_new_dependency(
    task: &Task,
    candidate: &TaskId,
    all_tasks: &[Task],
) -> ValidationReport {
    let index = index_by_id(all_tasks);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if task.dependencies.contains(candidate) {
        warnings.push(format!("Task already depends on {}", candidate));
    }
    check_dependency(task, candidate, &index, &mut errors, &mut warnings);

    ValidationReport::new(errors, warnings)
}

fn validate_indexed<'a>(task: &Task, index: &HashMap<&'a TaskId, &'a Task>) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for dep_id in &task.dependencies {
        check_dependency(task, dep_id, index, &mut errors, &mut warnings);
    }

    ValidationReport::new(errors, warnings)
}

fn check_dependency<'a>(
    task: &Task,
    dep_id: &TaskId,
    index: &HashMap<&'a TaskId, &'a Task>,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let Some(&dep) = index.get(dep_id) else {
        errors.push(format!("Dependency not found: {}", dep_id));
        return;
    };

    if has_cycle_indexed(task, dep, index) {
        errors.push(format!(
            "Circular dependency detected: {} -> {}",
            describe(task),
            describe(dep)
        ));
    }

    if task.status.is_active() && !dep.is_complete() {
        warnings.push(format!(
            "Task is active but dependency {} is {}",
            describe(dep),
            dep.status
        ));
    }

    if let (Some(start), Some(due)) = (task.start_date, dep.due_date) {
        if start < due {
            warnings.push(format!(
                "Task starts {} before dependency {} is due {}",
                start.date_naive(),
                describe(dep),
                due.date_naive()
            ));
        }
    }
}

fn describe(task: &Task) -> String {
    if task.name.is_empty() {
        task.id.to_string()
    } else {
        format!("'{}' ({})", task.name, task.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::parse_date;
    use crate::domain::TaskStatus;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn task(name: &str, deps: &[&str]) -> Task {
        deps.iter()
            .fold(Task::new(id(name), name), |t, d| t.depends_on(id(d)))
    }

    #[test]
    fn no_dependencies_is_trivially_valid() {
        let tasks = vec![task("A", &[])];
        let report = validate(&tasks[0], &tasks);
        assert!(report.valid);
        assert!(report.is_clean());
    }

    #[test]
    fn missing_reference_is_an_error() {
        let tasks = vec![task("X", &["ghost-id"])];
        let report = validate(&tasks[0], &tasks);

        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("ghost-id"));
    }

    #[test]
    fn every_member_of_a_cycle_reports_it() {
        let tasks = vec![task("A", &["C"]), task("B", &["A"]), task("C", &["B"])];
        for t in &tasks {
            let report = validate(t, &tasks);
            assert!(!report.valid, "{} should be invalid", t.id);
            assert!(report.errors[0].starts_with("Circular dependency detected"));
        }
    }

    #[test]
    fn active_task_with_unfinished_dependency_warns() {
        let tasks = vec![
            task("A", &[]),
            task("B", &["A"]).with_status(TaskStatus::Active),
        ];
        let report = validate(&tasks[1], &tasks);

        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("is pending"));
    }

    #[test]
    fn pending_task_with_unfinished_dependency_is_clean() {
        let tasks = vec![task("A", &[]), task("B", &["A"])];
        assert!(validate(&tasks[1], &tasks).is_clean());
    }

    #[test]
    fn completed_dependency_satisfies_active_task() {
        let tasks = vec![
            task("A", &[]).with_status(TaskStatus::Completed),
            task("B", &["A"]).with_status(TaskStatus::Active),
        ];
        assert!(validate(&tasks[1], &tasks).is_clean());
    }

    #[test]
    fn starting_before_dependency_due_date_warns() {
        let tasks = vec![
            task("A", &[]).with_dates(parse_date("2024-01-01"), parse_date("2024-01-10")),
            task("B", &["A"]).with_dates(parse_date("2024-01-05"), parse_date("2024-01-12")),
        ];
        let report = validate(&tasks[1], &tasks);

        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("2024-01-05"));
        assert!(report.warnings[0].contains("2024-01-10"));
    }

    #[test]
    fn starting_on_dependency_due_date_is_fine() {
        let tasks = vec![
            task("A", &[]).with_dates(parse_date("2024-01-01"), parse_date("2024-01-10")),
            task("B", &["A"]).with_dates(parse_date("2024-01-10"), parse_date("2024-01-12")),
        ];
        assert!(validate(&tasks[1], &tasks).is_clean());
    }

    #[test]
    fn errors_and_warnings_accumulate_per_dependency() {
        let tasks = vec![
            task("A", &[]),
            task("B", &["A", "ghost", "A"]).with_status(TaskStatus::Active),
        ];
        let report = validate(&tasks[1], &tasks);

        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn new_dependency_that_closes_a_loop_is_rejected() {
        let tasks = vec![task("A", &[]), task("B", &["A"]), task("C", &["B"])];
        let report = validate_new_dependency(&tasks[0], &id("C"), &tasks);

        assert!(!report.valid);
        assert!(report.errors[0].contains("'A' (A) -> 'C' (C)"));
    }

    #[test]
    fn new_dependency_already_declared_warns() {
        let tasks = vec![task("A", &[]), task("B", &["A"])];
        let report = validate_new_dependency(&tasks[1], &id("A"), &tasks);

        assert!(report.valid);
        assert_eq!(report.warnings, vec!["Task already depends on A".to_string()]);
    }

    #[test]
    fn validate_all_covers_every_task() {
        let tasks = vec![task("A", &[]), task("B", &["ghost"])];
        let reports = validate_all(&tasks);

        assert_eq!(reports.len(), 2);
        assert!(reports[0].1.valid);
        assert!(!reports[1].1.valid);
    }
}
