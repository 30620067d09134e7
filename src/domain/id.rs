//! Task identifiers
//!
//! Ids are opaque strings: the engine only compares them. Records imported
//! from elsewhere keep whatever id they came with, byte for byte; numeric
//! ids are read as their decimal text.
//!
//! Ids minted locally (`taskgraph task add`) use the format `t-{7-char-hash}`
//! (e.g. `t-9d3e5f2`). The hash is derived from name + creation timestamp,
//! so the same name at different times produces different ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Task ID must not be empty")]
    Empty,
}

/// Generates a 7-character hash from name and timestamp
fn generate_hash(name: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", name, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Opaque task identifier, unique within one task set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Mints a new `t-{hash}` id from name and timestamp
    pub fn generate(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self(format!("t-{}", generate_hash(name, timestamp)))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id from a decoded record value: strings verbatim, numbers
    /// as text, anything else `None`
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Parses an id typed by a user; only a blank id is refused
impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a string or number task id, found {}", value))
        })
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
