//! Dependency engine for taskgraph
//!
//! Pure functions over a borrowed task snapshot, without any I/O concerns.
//! Nothing is cached between calls: re-run after every task or dependency
//! change.

mod id;
mod task;
mod schedule;
mod graph;
mod cycle;
mod validation;
mod blocking;
mod ordering;
mod critical_path;
mod geometry;

pub use id::{IdError, TaskId};
pub use task::{index_by_id, Task, TaskMeta, TaskStatus};
pub use schedule::{
    is_critical, parse_date, span_days, task_duration, ScheduleOffset, CRITICAL_SLACK_TOLERANCE,
    DEFAULT_DURATION_DAYS,
};
pub use graph::{DependencyGraph, GraphError};
pub use cycle::has_cycle;
pub use validation::{validate, validate_all, validate_new_dependency, ValidationReport};
pub use blocking::{blocked_tasks, can_start, ready_tasks, StartCheck};
pub use ordering::{topological_sort, try_topological_order, OrderError};
pub use critical_path::{calculate_critical_path, CriticalPathReport, ScheduleError, TaskInfo};
pub use geometry::{
    dependency_pairs, gantt_layout, gantt_layout_scheduled, DependencyArrow, GanttLayout,
    GanttWindow, Point, RowLayout, TaskBar,
};
