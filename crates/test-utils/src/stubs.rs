#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitepipe::engine::RunOutcome;
use sitepipe::exec::Task;
use sitepipe::reload::ReloadSink;
use sitepipe::types::ReloadKind;

/// One observable step of a stub task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Started(String),
    Finished(String),
    Failed(String),
}

/// Shared, ordered record of what stub tasks did.
#[derive(Debug, Clone, Default)]
pub struct ExecLog {
    inner: Arc<Mutex<Vec<Step>>>,
}

impl ExecLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, step: Step) {
        self.inner.lock().unwrap().push(step);
    }

    pub fn steps(&self) -> Vec<Step> {
        self.inner.lock().unwrap().clone()
    }

    /// Names of tasks in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.steps()
            .into_iter()
            .filter_map(|s| match s {
                Step::Started(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn start_count(&self, name: &str) -> usize {
        self.started().iter().filter(|n| *n == name).count()
    }

    /// Position of a step in the log.
    pub fn index_of(&self, step: &Step) -> Option<usize> {
        self.steps().iter().position(|s| s == step)
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

/// Configurable in-process task that records into an [`ExecLog`].
pub struct StubTask {
    name: String,
    log: ExecLog,
    delay: Duration,
    fail: bool,
}

impl StubTask {
    pub fn new(name: &str, log: &ExecLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    /// Sleep this long (tokio time) before finishing.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn build(self) -> Task {
        let StubTask {
            name,
            log,
            delay,
            fail,
        } = self;
        let task_name = name.clone();

        Task::from_fn(task_name, move || {
            let name = name.clone();
            let log = log.clone();
            async move {
                log.push(Step::Started(name.clone()));
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if fail {
                    log.push(Step::Failed(name.clone()));
                    anyhow::bail!("stub task '{name}' failed");
                }
                log.push(Step::Finished(name));
                Ok(())
            }
        })
    }
}

pub fn ok_task(name: &str, log: &ExecLog) -> Task {
    StubTask::new(name, log).build()
}

pub fn failing_task(name: &str, log: &ExecLog) -> Task {
    StubTask::new(name, log).failing().build()
}

pub fn slow_task(name: &str, delay: Duration, log: &ExecLog) -> Task {
    StubTask::new(name, log).delay(delay).build()
}

/// What a [`RecordingSink`] was told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub source: String,
    pub succeeded: bool,
    pub failed_tasks: Vec<String>,
    pub kind: ReloadKind,
}

/// Reload sink that remembers every notification.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

impl ReloadSink for RecordingSink {
    fn notify(&self, source: &str, outcome: &RunOutcome, kind: ReloadKind) {
        let failed_tasks = match outcome {
            Ok(()) => Vec::new(),
            Err(f) => f.failed_tasks().into_iter().map(str::to_string).collect(),
        };
        self.inner.lock().unwrap().push(Notification {
            source: source.to_string(),
            succeeded: outcome.is_ok(),
            failed_tasks,
            kind,
        });
    }
}
