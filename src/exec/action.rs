// src/exec/action.rs

//! The `Task` value and the `TaskAction` seam.
//!
//! A task is a name plus an action. Actions are shared (`Arc`) so the same
//! task can appear in several graph positions and in several watch bindings
//! without being rebuilt.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::engine::TaskName;

/// Boxed future returned by [`TaskAction::run`].
pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Per-execution context handed to every action of a run.
///
/// A fresh one is created for each run; nothing carries over between runs.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Monotonically increasing run identifier from the pipeline runner.
    pub run_id: u64,
    /// What started the run (entry point name or watch binding label).
    pub label: String,
}

/// One external transformation step (or an in-process stand-in).
///
/// Implementations must not read global process state; everything they need
/// is captured when the graph is composed.
pub trait TaskAction: Send + Sync {
    fn run<'a>(&'a self, ctx: &'a RunContext) -> ActionFuture<'a>;

    /// One-line human description for `--dry-run`.
    fn describe(&self) -> String;
}

/// Smallest schedulable unit: a name plus an action.
#[derive(Clone)]
pub struct Task {
    name: TaskName,
    action: Arc<dyn TaskAction>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Task {
    pub fn new(name: impl Into<TaskName>, action: impl TaskAction + 'static) -> Self {
        Self {
            name: name.into(),
            action: Arc::new(action),
        }
    }

    pub fn from_action(name: impl Into<TaskName>, action: Arc<dyn TaskAction>) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }

    /// Build a task from an async closure.
    pub fn from_fn<F, Fut>(name: impl Into<TaskName>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::new(name, FnAction { f })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn describe(&self) -> String {
        self.action.describe()
    }

    pub fn run<'a>(&'a self, ctx: &'a RunContext) -> ActionFuture<'a> {
        self.action.run(ctx)
    }
}

/// Action backed by an async closure.
pub struct FnAction<F> {
    f: F,
}

impl<F, Fut> TaskAction for FnAction<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn run<'a>(&'a self, _ctx: &'a RunContext) -> ActionFuture<'a> {
        Box::pin((self.f)())
    }

    fn describe(&self) -> String {
        "in-process function".to_string()
    }
}

/// Wraps another action so that its failures are logged and swallowed.
///
/// Linters that only gate `build` use this in `dev`.
pub struct TolerantAction {
    task: TaskName,
    inner: Arc<dyn TaskAction>,
}

impl TolerantAction {
    pub fn new(task: impl Into<TaskName>, inner: Arc<dyn TaskAction>) -> Self {
        Self {
            task: task.into(),
            inner,
        }
    }
}

impl TaskAction for TolerantAction {
    fn run<'a>(&'a self, ctx: &'a RunContext) -> ActionFuture<'a> {
        Box::pin(async move {
            if let Err(err) = self.inner.run(ctx).await {
                warn!(
                    task = %self.task,
                    run_id = ctx.run_id,
                    error = %err,
                    "task failed (non-fatal in this mode)"
                );
            }
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("{} (non-fatal)", self.inner.describe())
    }
}
