//! Gantt geometry for dependency arrows
//!
//! Turns resolved (predecessor, successor) pairs into drawable bars and
//! elbow arrows. Horizontal positions are percentages of the calendar
//! window; vertical positions are pixels from the top of the chart.
//!
//! ```text
//!   [ predecessor ]──┐
//!                    │
//!                    └──▶[ successor ]
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::critical_path::CriticalPathReport;
use super::id::TaskId;
use super::schedule::DEFAULT_DURATION_DAYS;
use super::task::{index_by_id, Task};

/// Row geometry for the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowLayout {
    /// Pixels per task row
    pub row_height: f64,
    /// Pixels of bar height inside a row
    pub bar_height: f64,
    /// Pixels above the first row
    pub header_height: f64,
    /// Percent of window width an arrow travels before turning
    pub elbow_offset: f64,
    /// Percent of window width from arrow tip to arrowhead base
    pub arrow_width: f64,
    /// Pixels across the arrowhead base
    pub arrow_height: f64,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            row_height: 40.0,
            bar_height: 24.0,
            header_height: 0.0,
            elbow_offset: 1.0,
            arrow_width: 0.6,
            arrow_height: 8.0,
        }
    }
}

impl RowLayout {
    fn row_top(&self, row: usize) -> f64 {
        self.header_height + row as f64 * self.row_height
    }
}

/// Calendar range shown on the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GanttWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl GanttWindow {
    /// Creates a window; `None` unless `end` is at least a millisecond after `start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        ((end - start).num_milliseconds() > 0).then_some(Self { start, end })
    }

    /// Smallest window covering every task bar, `None` if no task has a date
    pub fn spanning(tasks: &[Task]) -> Option<Self> {
        let spans: Vec<_> = tasks.iter().filter_map(calendar_span).collect();
        let start = spans.iter().map(|(s, _)| *s).min()?;
        let end = spans.iter().map(|(_, e)| *e).max()?;
        Self::new(start, end)
    }

    /// Position of a timestamp as a percentage of the window, clamped to 0..=100
    pub fn percent_of(&self, at: DateTime<Utc>) -> f64 {
        let total = (self.end - self.start).num_milliseconds() as f64;
        let offset = (at - self.start).num_milliseconds() as f64;
        (offset / total * 100.0).clamp(0.0, 100.0)
    }
}

/// A point on the chart: `x` in percent, `y` in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One task bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskBar {
    pub id: TaskId,
    pub row: usize,
    pub left: f64,
    pub width: f64,
    pub top: f64,
    pub height: f64,
}

impl TaskBar {
    fn start_anchor(&self) -> Point {
        Point::new(self.left, self.top + self.height / 2.0)
    }

    fn end_anchor(&self) -> Point {
        Point::new(self.left + self.width, self.top + self.height / 2.0)
    }
}

/// Connector from a predecessor's end to a successor's start
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyArrow {
    pub from: TaskId,
    pub to: TaskId,
    /// Polyline, first point on the predecessor, last on the successor
    pub path: Vec<Point>,
    /// Tip first, then the two base corners
    pub arrowhead: [Point; 3],
}

/// Everything needed to draw the chart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GanttLayout {
    pub bars: Vec<TaskBar>,
    pub arrows: Vec<DependencyArrow>,
}

/// Resolves declared dependencies to (predecessor, successor) pairs
///
/// Pairs follow the successor's position in `tasks`, then declaration order.
/// Unresolved ids are dropped.
pub fn dependency_pairs(tasks: &[Task]) -> Vec<(&Task, &Task)> {
    let index = index_by_id(tasks);
    tasks
        .iter()
        .flat_map(|successor| {
            successor
                .dependencies
                .iter()
                .filter_map(|dep_id| index.get(dep_id).map(|&pred| (pred, successor)))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Lays out tasks from their own calendar dates, one row per task in slice order
///
/// A task with only one date gets a default-length bar from it; a task
/// with neither keeps its row but gets no bar.
pub fn gantt_layout(tasks: &[Task], window: &GanttWindow, layout: &RowLayout) -> GanttLayout {
    let spans = tasks.iter().map(calendar_span).collect::<Vec<_>>();
    build_layout(tasks, &spans, window, layout)
}

/// Lays out tasks at their earliest schedule offsets from `project_start`
///
/// Every task in the report gets a bar, dated or not. The window runs from
/// `project_start` over the project duration.
pub fn gantt_layout_scheduled(
    tasks: &[Task],
    report: &CriticalPathReport,
    project_start: DateTime<Utc>,
    layout: &RowLayout,
) -> Option<GanttLayout> {
    let end = project_start + Duration::days(report.project_duration);
    let window = GanttWindow::new(project_start, end)?;

    let spans = tasks
        .iter()
        .map(|task| {
            report.task(&task.id).map(|info| {
                (
                    info.earliest_start.to_calendar(project_start),
                    info.earliest_finish().to_calendar(project_start),
                )
            })
        })
        .collect::<Vec<_>>();

    Some(build_layout(tasks, &spans, &window, layout))
}

type Span = Option<(DateTime<Utc>, DateTime<Utc>)>;

fn calendar_span(task: &Task) -> Span {
    let default = Duration::days(DEFAULT_DURATION_DAYS);
    match (task.start_date, task.due_date) {
        (Some(start), Some(due)) if due >= start => Some((start, due.max(start + default))),
        (Some(start), Some(due)) => Some((due, start)),
        (Some(start), None) => Some((start, start + default)),
        (None, Some(due)) => Some((due - default, due)),
        (None, None) => None,
    }
}

fn build_layout(
    tasks: &[Task],
    spans: &[Span],
    window: &GanttWindow,
    layout: &RowLayout,
) -> GanttLayout {
    let inset = (layout.row_height - layout.bar_height).max(0.0) / 2.0;

    let bars: Vec<Option<TaskBar>> = tasks
        .iter()
        .zip(spans)
        .enumerate()
        .map(|(row, (task, span))| {
            span.map(|(start, end)| {
                let left = window.percent_of(start);
                TaskBar {
                    id: task.id.clone(),
                    row,
                    left,
                    width: window.percent_of(end) - left,
                    top: layout.row_top(row) + inset,
                    height: layout.bar_height,
                }
            })
        })
        .collect();

    let arrows = {
        // First occurrence of an id owns its bar
        let mut bar_of = HashMap::new();
        for (task, bar) in tasks.iter().zip(&bars) {
            if let Some(bar) = bar {
                bar_of.entry(&task.id).or_insert(bar);
            }
        }

        dependency_pairs(tasks)
            .into_iter()
            .filter_map(|(pred, succ)| {
                let from = bar_of.get(&pred.id)?;
                let to = bar_of.get(&succ.id)?;
                Some(elbow_arrow(from, to, layout))
            })
            .collect()
    };

    GanttLayout {
        bars: bars.into_iter().flatten().collect(),
        arrows,
    }
}

fn elbow_arrow(from: &TaskBar, to: &TaskBar, layout: &RowLayout) -> DependencyArrow {
    let start = from.end_anchor();
    let end = to.start_anchor();
    let out_x = start.x + layout.elbow_offset;
    let in_x = end.x - layout.elbow_offset;

    let path = if in_x >= out_x {
        // Room to drop straight down between the bars
        vec![
            start,
            Point::new(out_x, start.y),
            Point::new(out_x, end.y),
            end,
        ]
    } else {
        // Successor starts before the predecessor ends: route through the
        // gap between the two rows and come back in from the left
        let direction = if end.y >= start.y { 1.0 } else { -1.0 };
        let gap_y = start.y + direction * layout.row_height / 2.0;
        vec![
            start,
            Point::new(out_x, start.y),
            Point::new(out_x, gap_y),
            Point::new(in_x, gap_y),
            Point::new(in_x, end.y),
            end,
        ]
    };

    let base_x = end.x - layout.arrow_width;
    let half = layout.arrow_height / 2.0;
    DependencyArrow {
        from: from.id.clone(),
        to: to.id.clone(),
        path,
        arrowhead: [
            end,
            Point::new(base_x, end.y - half),
            Point::new(base_x, end.y + half),
        ],
    }
}
