//! taskgraph - dependency analysis for task lists
//!
//! The [`domain`] engine validates dependencies, resolves what is blocked,
//! orders tasks, computes the critical path and lays out Gantt geometry.
//! [`storage`] and [`cli`] wrap it in a local-first command-line tool.

pub mod domain;
pub mod storage;
pub mod cli;
pub mod logging;

pub use domain::{Task, TaskId, TaskStatus};
