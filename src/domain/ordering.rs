//! Dependency-respecting task order
//!
//! Depth-first topological sort with three marks. Roots are taken in input
//! order and dependencies in declaration order, so the result is stable for
//! a given snapshot.

use std::collections::HashMap;

use thiserror::Error;

use super::id::TaskId;
use super::task::Task;

#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("Dependency cycle detected at task {0}")]
    Cycle(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// On the current DFS stack
    Visiting,
    Done,
}

/// Orders tasks so every task comes after all of its resolved dependencies
///
/// Fails on the first cycle found. Unresolved dependency ids are ignored.
pub fn try_topological_order(tasks: &[Task]) -> Result<Vec<&Task>, OrderError> {
    // First occurrence wins for repeated ids, as everywhere else
    let mut positions: HashMap<&TaskId, usize> = HashMap::with_capacity(tasks.len());
    for (pos, task) in tasks.iter().enumerate() {
        positions.entry(&task.id).or_insert(pos);
    }

    let mut sorter = Sorter {
        tasks,
        positions,
        marks: vec![Mark::Unvisited; tasks.len()],
        order: Vec::with_capacity(tasks.len()),
    };

    for pos in 0..tasks.len() {
        sorter.visit(pos)?;
    }

    Ok(sorter.order)
}

/// Orders tasks by dependency, or returns them in input order if there is a cycle
///
/// Callers must not assume the result is sorted when the set is cyclic; use
/// [`try_topological_order`] to tell the two apart.
pub fn topological_sort(tasks: &[Task]) -> Vec<&Task> {
    match try_topological_order(tasks) {
        Ok(order) => order,
        Err(err) => {
            tracing::warn!(%err, "topological sort fell back to input order");
            tasks.iter().collect()
        }
    }
}

struct Sorter<'a> {
    tasks: &'a [Task],
    positions: HashMap<&'a TaskId, usize>,
    marks: Vec<Mark>,
    order: Vec<&'a Task>,
}

impl Sorter<'_> {
    fn visit(&mut self, pos: usize) -> Result<(), OrderError> {
        let tasks = self.tasks;
        let task = &tasks[pos];
        match self.marks[pos] {
            Mark::Done => return Ok(()),
            Mark::Visiting => return Err(OrderError::Cycle(task.id.clone())),
            Mark::Unvisited => {}
        }

        self.marks[pos] = Mark::Visiting;
        for dep_id in &task.dependencies {
            if let Some(&dep_pos) = self.positions.get(dep_id) {
                self.visit(dep_pos)?;
            }
        }
        self.marks[pos] = Mark::Done;
        self.order.push(task);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn task(name: &str, deps: &[&str]) -> Task {
        deps.iter()
            .fold(Task::new(id(name), name), |t, d| t.depends_on(id(d)))
    }

    fn names(order: &[&Task]) -> Vec<String> {
        order.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn empty_input() {
        assert!(topological_sort(&[]).is_empty());
    }

    #[test]
    fn dependencies_come_first() {
        let tasks = vec![task("C", &["B"]), task("B", &["A"]), task("A", &[])];
        assert_eq!(names(&topological_sort(&tasks)), vec!["A", "B", "C"]);
    }

    #[test]
    fn independent_tasks_keep_input_order() {
        let tasks = vec![task("Z", &[]), task("Y", &[]), task("X", &[])];
        assert_eq!(names(&topological_sort(&tasks)), vec!["Z", "Y", "X"]);
    }

    #[test]
    fn diamond_order() {
        let tasks = vec![
            task("D", &["B", "C"]),
            task("C", &["A"]),
            task("B", &["A"]),
            task("A", &[]),
        ];
        assert_eq!(names(&topological_sort(&tasks)), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn cycle_returns_input_unchanged() {
        let tasks = vec![
            task("A", &["C"]),
            task("B", &["A"]),
            task("C", &["B"]),
            task("D", &[]),
        ];
        assert_eq!(names(&topological_sort(&tasks)), vec!["A", "B", "C", "D"]);
        assert!(matches!(
            try_topological_order(&tasks),
            Err(OrderError::Cycle(_))
        ));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let tasks = vec![task("A", &["A"])];
        assert_eq!(try_topological_order(&tasks), Err(OrderError::Cycle(id("A"))));
    }

    #[test]
    fn dangling_references_are_ignored() {
        let tasks = vec![task("B", &["ghost", "A"]), task("A", &[])];
        assert_eq!(names(&topological_sort(&tasks)), vec!["A", "B"]);
    }

    #[test]
    fn duplicate_ids_are_all_kept() {
        let tasks = vec![task("A", &[]), task("A", &[]), task("B", &["A"])];
        assert_eq!(topological_sort(&tasks).len(), 3);
    }
}
