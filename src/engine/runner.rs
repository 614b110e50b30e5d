// src/engine/runner.rs

//! Executes a composed `TaskNode` once, end to end.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tracing::{debug, error, info};

use crate::compose::TaskNode;
use crate::engine::outcome::{RunFailure, RunOutcome, TaskFailure};
use crate::exec::{RunContext, Task};

/// Runs task graphs.
///
/// There is no timeout: a hanging external tool hangs the run. Each call to
/// [`PipelineRunner::run`] gets a fresh [`RunContext`] with a new run id.
#[derive(Debug, Default)]
pub struct PipelineRunner {
    run_counter: AtomicU64,
}

impl PipelineRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `node` to completion. `label` names the run in logs (entry point
    /// or watch binding).
    pub async fn run(&self, node: &TaskNode, label: &str) -> RunOutcome {
        let run_id = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let ctx = RunContext {
            run_id,
            label: label.to_string(),
        };

        info!(run_id, label, tasks = ?node.task_names(), "pipeline run started");
        let started = Instant::now();

        let outcome = execute(node, &ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(()) => info!(run_id, label, elapsed_ms, "pipeline run succeeded"),
            Err(failure) => error!(
                run_id,
                label,
                elapsed_ms,
                failed = ?failure.failed_tasks(),
                "pipeline run failed"
            ),
        }

        outcome
    }
}

/// Execute a node within an existing run context.
///
/// - Series: children one at a time; the first failure skips the rest and
///   is returned as-is.
/// - Parallel: all children are polled concurrently until every one of them
///   is terminal; failures are flattened into one `Composition`.
pub fn execute<'a>(node: &'a TaskNode, ctx: &'a RunContext) -> BoxFuture<'a, RunOutcome> {
    Box::pin(async move {
        match node {
            TaskNode::Leaf(task) => run_leaf(task, ctx).await,
            TaskNode::Series(children) => {
                for (idx, child) in children.iter().enumerate() {
                    if let Err(failure) = execute(child, ctx).await {
                        let skipped: Vec<&str> = children[idx + 1..]
                            .iter()
                            .flat_map(|c| c.task_names())
                            .collect();
                        if !skipped.is_empty() {
                            debug!(
                                run_id = ctx.run_id,
                                ?skipped,
                                "series short-circuited; skipping remaining children"
                            );
                        }
                        return Err(failure);
                    }
                }
                Ok(())
            }
            TaskNode::Parallel(children) => {
                let results = join_all(children.iter().map(|c| execute(c, ctx))).await;
                let failures: Vec<TaskFailure> = results
                    .into_iter()
                    .filter_map(Result::err)
                    .flat_map(RunFailure::into_failures)
                    .collect();

                if failures.is_empty() {
                    Ok(())
                } else {
                    Err(RunFailure::Composition(failures))
                }
            }
        }
    })
}

async fn run_leaf(task: &Task, ctx: &RunContext) -> RunOutcome {
    debug!(task = %task.name(), run_id = ctx.run_id, "task started");
    let started = Instant::now();

    // A panicking action counts as a failed task.
    let result = AssertUnwindSafe(async { task.run(ctx).await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload))));

    match result {
        Ok(()) => {
            info!(
                task = %task.name(),
                run_id = ctx.run_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "task finished"
            );
            Ok(())
        }
        Err(err) => {
            error!(
                task = %task.name(),
                run_id = ctx.run_id,
                error = %format!("{err:#}"),
                "task failed"
            );
            Err(RunFailure::Task(TaskFailure::new(
                task.name(),
                format!("{err:#}"),
            )))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}
