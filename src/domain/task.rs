//! Task domain model
//!
//! Tasks are the unit of scheduling. The engine reads only `id`, `status`,
//! the two dates and `dependencies`; everything else a record carries
//! (project, assignee, tags, ...) is kept verbatim in [`TaskMeta`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::TaskId;
use super::schedule;

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "todo")]
    Pending,
    #[serde(alias = "in_progress")]
    Active,
    Blocked,
    #[serde(alias = "done")]
    Completed,
}

impl TaskStatus {
    /// Returns true if this status satisfies dependents
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Returns true if this task is currently being worked on
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Active)
    }

    /// Returns the serialized label
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "todo" => Ok(TaskStatus::Pending),
            "active" | "in_progress" => Ok(TaskStatus::Active),
            "blocked" => Ok(TaskStatus::Blocked),
            "completed" | "done" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "unknown status '{}' (expected pending, active, blocked or completed)",
                other
            )),
        }
    }
}

/// Opaque payload of a task record - every field the engine does not read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskMeta(BTreeMap<String, serde_json::Value>);

impl TaskMeta {
    /// Creates empty metadata
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Gets a value by key
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Sets a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns true if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all key-value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }
}

/// A schedulable task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier within the task set
    pub id: TaskId,

    /// Display label
    #[serde(default, alias = "title")]
    pub name: String,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Planned start
    #[serde(
        default,
        alias = "start_date",
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,

    /// Planned completion
    #[serde(
        default,
        alias = "due_date",
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,

    /// Ids of the tasks this one depends on, in declaration order
    #[serde(default, deserialize_with = "lenient_dependencies")]
    pub dependencies: Vec<TaskId>,

    /// Everything else on the record
    #[serde(flatten)]
    pub meta: TaskMeta,
}

/// Accepts RFC 3339, `YYYY-MM-DD` or epoch milliseconds; anything else is `None`
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match &value {
        Some(serde_json::Value::String(raw)) => schedule::parse_date(raw),
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };

    if parsed.is_none() {
        if let Some(raw) = value.filter(|v| !v.is_null()) {
            tracing::debug!(%raw, "ignoring unparsable task date");
        }
    }

    Ok(parsed)
}

/// Accepts a list of string or numeric ids, a single id, or `null`;
/// entries that are not ids are dropped
fn lenient_dependencies<'de, D>(deserializer: D) -> Result<Vec<TaskId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let ids = match &value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let id = TaskId::from_value(item);
                if id.is_none() {
                    tracing::debug!(%item, "ignoring non-id dependency entry");
                }
                id
            })
            .collect(),
        other => match TaskId::from_value(other) {
            Some(id) => vec![id],
            None => {
                tracing::debug!(%other, "ignoring unreadable dependencies");
                Vec::new()
            }
        },
    };
    Ok(ids)
}

impl Task {
    /// Creates a pending task with no dates and no dependencies
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: TaskStatus::Pending,
            start_date: None,
            due_date: None,
            dependencies: Vec::new(),
            meta: TaskMeta::new(),
        }
    }

    /// Builder: sets the status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: sets start and due dates
    pub fn with_dates(mut self, start: Option<DateTime<Utc>>, due: Option<DateTime<Utc>>) -> Self {
        self.start_date = start;
        self.due_date = due;
        self
    }

    /// Builder: appends a dependency
    pub fn depends_on(mut self, id: TaskId) -> Self {
        self.dependencies.push(id);
        self
    }

    /// Adds a dependency unless it is already declared
    pub fn add_dependency(&mut self, id: TaskId) -> bool {
        if self.dependencies.contains(&id) {
            return false;
        }
        self.dependencies.push(id);
        true
    }

    /// Removes every occurrence of a dependency
    pub fn remove_dependency(&mut self, id: &TaskId) -> bool {
        let len_before = self.dependencies.len();
        self.dependencies.retain(|d| d != id);
        self.dependencies.len() != len_before
    }

    /// Returns true if the task declares any dependency
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }

    /// Returns true if this task satisfies its dependents
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

/// Indexes a task slice by id; the first occurrence of a repeated id wins
pub fn index_by_id(tasks: &[Task]) -> HashMap<&TaskId, &Task> {
    let mut index = HashMap::with_capacity(tasks.len());
    for task in tasks {
        index.entry(&task.id).or_insert(task);
    }
    index
}
