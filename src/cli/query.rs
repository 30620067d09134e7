//! Query commands (validate, ready, blocked, order, critical-path, gantt)
//!
//! Every query loads a fresh snapshot and runs the engine over it.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, Utc};

use super::output::Output;
use super::source::{find, parse_date_arg, parse_id, TaskSource};
use crate::domain::{
    blocked_tasks, calculate_critical_path, gantt_layout, gantt_layout_scheduled, ready_tasks,
    topological_sort, try_topological_order, validate, validate_all, GanttLayout, GanttWindow,
    Task, TaskInfo, ValidationReport,
};

/// Validate one task or all of them; returns false if any task has errors
pub fn validate_tasks(source: &TaskSource, output: &Output, id: Option<&str>) -> Result<bool> {
    let tasks = source.load()?;

    let reports: Vec<(&Task, ValidationReport)> = match id {
        Some(raw) => {
            let task = find(&tasks, &parse_id(raw)?)?;
            vec![(task, validate(task, &tasks))]
        }
        None => validate_all(&tasks),
    };

    let error_count: usize = reports.iter().map(|(_, r)| r.errors.len()).sum();
    let warning_count: usize = reports.iter().map(|(_, r)| r.warnings.len()).sum();
    tracing::debug!(tasks = reports.len(), errors = error_count, warnings = warning_count, "validated");

    if output.is_json() {
        let items: Vec<_> = reports
            .iter()
            .map(|(task, report)| {
                serde_json::json!({
                    "id": task.id,
                    "valid": report.valid,
                    "errors": report.errors,
                    "warnings": report.warnings,
                })
            })
            .collect();
        output.data(&items);
    } else {
        for (task, report) in reports.iter().filter(|(_, r)| !r.is_clean()) {
            println!("{} ({})", task.id, task.name);
            for error in &report.errors {
                println!("  error: {}", error);
            }
            for warning in &report.warnings {
                println!("  warning: {}", warning);
            }
        }
        println!(
            "Checked {} task(s): {} error(s), {} warning(s)",
            reports.len(),
            error_count,
            warning_count
        );
    }

    Ok(error_count == 0)
}

/// Show tasks ready to work on
pub fn ready(source: &TaskSource, output: &Output) -> Result<()> {
    let tasks = source.load()?;
    let ready = ready_tasks(&tasks);

    if output.is_json() {
        output.data(&ready);
    } else if ready.is_empty() {
        println!("No tasks ready to work on.");
    } else {
        println!("Ready tasks ({}):", ready.len());
        output.header(&format!("{:<20} {:<10} NAME", "ID", "STATUS"), 60);
        for task in ready {
            println!("{:<20} {:<10} {}", task.id, task.status, task.name);
        }
    }

    Ok(())
}

/// Show blocked tasks and what blocks them
pub fn blocked(source: &TaskSource, output: &Output) -> Result<()> {
    let tasks = source.load()?;
    let blocked = blocked_tasks(&tasks);

    if output.is_json() {
        let items: Vec<_> = blocked
            .iter()
            .map(|(task, blockers)| {
                serde_json::json!({
                    "id": task.id,
                    "name": task.name,
                    "blockedBy": blockers.iter().map(|b| &b.id).collect::<Vec<_>>(),
                })
            })
            .collect();
        output.data(&items);
    } else if blocked.is_empty() {
        println!("No blocked tasks.");
    } else {
        println!("Blocked tasks ({}):", blocked.len());
        output.header(&format!("{:<20} {:<30} BLOCKED BY", "ID", "NAME"), 80);
        for (task, blockers) in blocked {
            let ids = blockers
                .iter()
                .map(|b| b.id.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("{:<20} {:<30} {}", task.id, task.name, ids);
        }
    }

    Ok(())
}

/// Show tasks in dependency order
pub fn order(source: &TaskSource, output: &Output) -> Result<()> {
    let tasks = source.load()?;

    let (ordered, fallback) = match try_topological_order(&tasks) {
        Ok(ordered) => (ordered, false),
        Err(_) => (topological_sort(&tasks), true),
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "order": ordered.iter().map(|t| &t.id).collect::<Vec<_>>(),
            "fallback": fallback,
        }));
        return Ok(());
    }

    if fallback {
        output.warning("circular dependencies found; showing tasks in stored order");
    }
    for (position, task) in ordered.iter().enumerate() {
        println!("{:>3}. {:<20} {}", position + 1, task.id, task.name);
    }

    Ok(())
}

/// Show the critical path, with calendar dates when a start date is given
pub fn critical_path(source: &TaskSource, output: &Output, start: Option<&str>) -> Result<()> {
    let tasks = source.load()?;
    let project_start = start.map(parse_date_arg).transpose()?;
    let report = calculate_critical_path(&tasks)?;

    if output.is_json() {
        let mut value = serde_json::to_value(&report).context("Failed to serialize report")?;
        if let (Some(start), Some(object)) = (project_start, value.as_object_mut()) {
            let end = start + chrono::Duration::days(report.project_duration);
            object.insert("projectStart".into(), serde_json::json!(start));
            object.insert("projectEnd".into(), serde_json::json!(end));
        }
        output.data(&value);
        return Ok(());
    }

    if report.task_details.is_empty() {
        println!("No tasks");
        return Ok(());
    }

    output.header(
        &format!(
            "{:<20} {:>5} {:>6} {:>6} {:>6}  {}",
            "ID", "DAYS", "ES", "LS", "SLACK", "NAME"
        ),
        70,
    );
    for info in &report.task_details {
        let marker = if info.is_critical() { "*" } else { " " };
        println!(
            "{:<20} {:>5} {:>6} {:>6} {:>6} {}{}{}",
            info.id,
            info.duration,
            info.earliest_start.days(),
            info.latest_start.days(),
            info.slack,
            marker,
            info.name,
            calendar_suffix(info, project_start),
        );
    }

    println!();
    let path = report
        .critical_path
        .iter()
        .map(|info| info.id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ");
    println!("Critical path: {}", path);
    println!("Project duration: {} day(s)", report.project_duration);
    if let Some(start) = project_start {
        let end = start + chrono::Duration::days(report.project_duration);
        println!(
            "Calendar: {} to {}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
    }

    Ok(())
}

fn calendar_suffix(info: &TaskInfo, project_start: Option<DateTime<Utc>>) -> String {
    match project_start {
        Some(start) => format!(
            " ({} .. {})",
            info.earliest_start.to_calendar(start).format("%Y-%m-%d"),
            info.earliest_finish().to_calendar(start).format("%Y-%m-%d"),
        ),
        None => String::new(),
    }
}

/// Gantt chart geometry: bars and dependency arrows
pub fn gantt(
    source: &TaskSource,
    output: &Output,
    from: Option<&str>,
    to: Option<&str>,
    schedule: bool,
) -> Result<()> {
    let tasks = source.load()?;
    let layout = source.layout();
    let from = from.map(parse_date_arg).transpose()?;
    let to = to.map(parse_date_arg).transpose()?;

    let chart = if tasks.is_empty() {
        GanttLayout::default()
    } else if schedule {
        let report = calculate_critical_path(&tasks)?;
        let start = from.unwrap_or_else(today);
        gantt_layout_scheduled(&tasks, &report, start, &layout)
            .context("Schedule has no duration to chart")?
    } else {
        let spanning = GanttWindow::spanning(&tasks);
        let start = from.or(spanning.map(|w| w.start));
        let end = to.or(spanning.map(|w| w.end));
        let (start, end) = start.zip(end).context(
            "No task has a start or due date; pass --from/--to or use --schedule",
        )?;
        let window = GanttWindow::new(start, end)
            .with_context(|| format!("Gantt window must end after it starts ({} .. {})", start, end))?;
        gantt_layout(&tasks, &window, &layout)
    };

    tracing::debug!(bars = chart.bars.len(), arrows = chart.arrows.len(), "gantt layout");

    if output.is_json() {
        output.data(&chart);
        return Ok(());
    }

    if chart.bars.is_empty() {
        println!("No tasks to chart");
        return Ok(());
    }

    const COLUMNS: f64 = 50.0;
    for bar in &chart.bars {
        let offset = (bar.left / 100.0 * COLUMNS).round() as usize;
        let length = ((bar.width / 100.0 * COLUMNS).round() as usize).max(1);
        println!(
            "{:<20} |{:<width$}|",
            bar.id,
            format!("{}{}", " ".repeat(offset), "#".repeat(length)),
            width = COLUMNS as usize
        );
    }

    if !chart.arrows.is_empty() {
        println!();
        println!("Dependencies ({}):", chart.arrows.len());
        for arrow in &chart.arrows {
            println!("  {} -> {} ({} points)", arrow.from, arrow.to, arrow.path.len());
        }
    }

    Ok(())
}

fn today() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}
