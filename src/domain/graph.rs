//! Dependency graph index for a task snapshot
//!
//! Built fresh from a task slice on every call; nothing is kept between
//! invocations. Uses petgraph for whole-graph questions (is there any cycle,
//! which tasks form it) and for dependents lookups in the backward pass.
//!
//! Edge direction is `dependency -> dependent`: "dependency must finish first".
//! Dependency ids that resolve to no task are not edges; they are recorded
//! in [`DependencyGraph::missing_references`].

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use super::id::TaskId;
use super::task::Task;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
}

/// A dependency graph over one task snapshot
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<TaskId, ()>,

    /// Map from TaskId to node index
    node_map: HashMap<TaskId, NodeIndex>,

    /// (task, dependency id) pairs whose dependency is not in the snapshot
    missing: Vec<(TaskId, TaskId)>,
}

impl DependencyGraph {
    /// Builds a graph from a task slice
    ///
    /// Fails if two tasks share an id. Repeated dependency ids become
    /// parallel edges.
    pub fn from_tasks(tasks: &[Task]) -> Result<Self, GraphError> {
        let mut graph = Self {
            graph: DiGraph::with_capacity(tasks.len(), tasks.len()),
            node_map: HashMap::with_capacity(tasks.len()),
            missing: Vec::new(),
        };

        // First pass: add all nodes
        for task in tasks {
            if graph.node_map.contains_key(&task.id) {
                return Err(GraphError::DuplicateTask(task.id.clone()));
            }
            let idx = graph.graph.add_node(task.id.clone());
            graph.node_map.insert(task.id.clone(), idx);
        }

        // Second pass: add all edges
        for task in tasks {
            let task_idx = graph.node_map[&task.id];
            for dep_id in &task.dependencies {
                match graph.node_map.get(dep_id) {
                    Some(&dep_idx) => {
                        graph.graph.add_edge(dep_idx, task_idx, ());
                    }
                    None => graph.missing.push((task.id.clone(), dep_id.clone())),
                }
            }
        }

        Ok(graph)
    }

    fn index_of(&self, task_id: &TaskId) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(task_id)
            .copied()
            .ok_or_else(|| GraphError::TaskNotFound(task_id.clone()))
    }

    fn neighbors(&self, task_id: &TaskId, direction: Direction) -> Result<Vec<TaskId>, GraphError> {
        let idx = self.index_of(task_id)?;
        let mut ids: Vec<TaskId> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        // petgraph walks edges newest first
        ids.reverse();
        Ok(ids)
    }

    /// Returns the resolved direct dependencies of a task
    pub fn dependencies(&self, task_id: &TaskId) -> Result<Vec<TaskId>, GraphError> {
        self.neighbors(task_id, Direction::Incoming)
    }

    /// Returns the direct dependents of a task (tasks that depend on it)
    pub fn dependents(&self, task_id: &TaskId) -> Result<Vec<TaskId>, GraphError> {
        self.neighbors(task_id, Direction::Outgoing)
    }

    /// Returns true if any dependency cycle exists
    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Returns every cycle as the set of tasks in one strongly connected component
    ///
    /// Self-dependencies count as one-task cycles.
    pub fn cycles(&self) -> Vec<Vec<TaskId>> {
        let mut cycles: Vec<Vec<TaskId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| self.graph.find_edge(n, n).is_some())
            })
            .map(|component| {
                let mut ids: Vec<TaskId> = component
                    .into_iter()
                    .filter_map(|n| self.graph.node_weight(n).cloned())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Dependency ids that did not resolve, as (task, missing id) pairs
    pub fn missing_references(&self) -> &[(TaskId, TaskId)] {
        &self.missing
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.node_map.contains_key(task_id)
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns the number of resolved dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
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

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::from_tasks(&[]).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(!graph.is_cyclic());
    }

    #[test]
    fn dependencies_and_dependents() {
        let tasks = vec![task("A", &[]), task("B", &["A"]), task("C", &["A", "B"])];
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.dependencies(&id("C")).unwrap(), vec![id("A"), id("B")]);
        assert_eq!(graph.dependents(&id("A")).unwrap(), vec![id("B"), id("C")]);
        assert!(graph.dependents(&id("C")).unwrap().is_empty());
    }

    #[test]
    fn unknown_task_returns_error() {
        let graph = DependencyGraph::from_tasks(&[task("A", &[])]).unwrap();
        let result = graph.dependents(&id("Z"));
        assert_eq!(result, Err(GraphError::TaskNotFound(id("Z"))));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let tasks = vec![task("A", &[]), task("A", &[])];
        let result = DependencyGraph::from_tasks(&tasks);
        assert!(matches!(result, Err(GraphError::DuplicateTask(_))));
    }

    #[test]
    fn missing_references_recorded() {
        let tasks = vec![task("X", &["ghost-id"])];
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(
            graph.missing_references(),
            &[(id("X"), id("ghost-id"))]
        );
    }

    #[test]
    fn cycle_detection() {
        let tasks = vec![
            task("A", &["C"]),
            task("B", &["A"]),
            task("C", &["B"]),
            task("D", &[]),
        ];
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();

        assert!(graph.is_cyclic());
        assert_eq!(graph.cycles(), vec![vec![id("A"), id("B"), id("C")]]);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let graph = DependencyGraph::from_tasks(&[task("A", &["A"])]).unwrap();
        assert!(graph.is_cyclic());
        assert_eq!(graph.cycles(), vec![vec![id("A")]]);
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let tasks = vec![task("A", &[]), task("B", &["A"]), task("C", &["A"])];
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();
        assert!(!graph.is_cyclic());
        assert!(graph.cycles().is_empty());
    }
}
