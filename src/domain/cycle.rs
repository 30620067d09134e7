//! Cycle detection for a single dependency edge
//!
//! Answers "would `task -> candidate` close a loop?" by walking the
//! candidate's own dependencies looking for the way back to `task`.

use std::collections::{HashMap, HashSet};

use super::id::TaskId;
use super::task::{index_by_id, Task};

/// Returns true if depending on `candidate` puts `task` on a cycle
///
/// Depth-first from `candidate` through its dependencies. Reaching `task.id`
/// is a cycle, and so is revisiting a node already on the current branch
/// (a loop further upstream; reported conservatively). Unresolved ids are
/// skipped.
pub fn has_cycle(task: &Task, candidate: &Task, all_tasks: &[Task]) -> bool {
    let index = index_by_id(all_tasks);
    has_cycle_indexed(task, candidate, &index)
}

/// [`has_cycle`] over a prebuilt id index
pub(crate) fn has_cycle_indexed<'a>(
    task: &Task,
    candidate: &'a Task,
    index: &HashMap<&'a TaskId, &'a Task>,
) -> bool {
    let mut search = CycleSearch {
        target: &task.id,
        index,
        path: HashSet::new(),
        cleared: HashSet::new(),
    };
    search.visit(candidate)
}

struct CycleSearch<'a, 'i> {
    target: &'i TaskId,
    index: &'i HashMap<&'a TaskId, &'a Task>,
    /// Nodes on the current branch only; removed again on the way back up
    path: HashSet<&'a TaskId>,
    /// Nodes whose whole upstream was searched without finding anything
    cleared: HashSet<&'a TaskId>,
}

impl<'a> CycleSearch<'a, '_> {
    fn visit(&mut self, node: &'a Task) -> bool {
        if &node.id == self.target || self.path.contains(&node.id) {
            return true;
        }
        if self.cleared.contains(&node.id) {
            return false;
        }

        self.path.insert(&node.id);
        let mut found = false;
        for dep_id in &node.dependencies {
            let Some(&dep) = self.index.get(dep_id) else {
                continue;
            };
            if self.visit(dep) {
                found = true;
                break;
            }
        }
        self.path.remove(&node.id);

        if !found {
            self.cleared.insert(&node.id);
        }
        found
    }
}
