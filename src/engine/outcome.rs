// src/engine/outcome.rs

//! Run results.

use thiserror::Error;

use crate::engine::TaskName;

/// An external step reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task '{task}' failed: {detail}")]
pub struct TaskFailure {
    pub task: TaskName,
    pub detail: String,
}

impl TaskFailure {
    pub fn new(task: impl Into<TaskName>, detail: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            detail: detail.into(),
        }
    }
}

/// Why a composed node failed.
///
/// - `Task`: a single step failed (propagated unchanged through series).
/// - `Composition`: a parallel node collected one or more failures; every
///   failed task is listed, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunFailure {
    #[error(transparent)]
    Task(TaskFailure),

    #[error("{} task(s) failed: {}", .0.len(), join_task_names(.0))]
    Composition(Vec<TaskFailure>),
}

fn join_task_names(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(|f| f.task.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl RunFailure {
    pub fn failures(&self) -> &[TaskFailure] {
        match self {
            RunFailure::Task(f) => std::slice::from_ref(f),
            RunFailure::Composition(fs) => fs,
        }
    }

    pub fn into_failures(self) -> Vec<TaskFailure> {
        match self {
            RunFailure::Task(f) => vec![f],
            RunFailure::Composition(fs) => fs,
        }
    }

    /// Names of every failed task.
    pub fn failed_tasks(&self) -> Vec<&str> {
        self.failures().iter().map(|f| f.task.as_str()).collect()
    }
}

/// Result of running a `TaskNode` to completion.
pub type RunOutcome = Result<(), RunFailure>;
