// src/engine/mod.rs

//! Execution engine.
//!
//! - [`runner`] executes a composed `TaskNode` once (series short-circuit,
//!   parallel join-all).
//! - [`queue`] holds per-binding debounce and coalescing state.
//! - [`core`] is the pure watch reactor: events in, commands out.
//! - [`runtime`] is the async shell around the core that arms timers,
//!   spawns runs and forwards outcomes to a reload sink.

use std::time::Duration;

use crate::watch::binding::BindingId;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Trailing debounce window applied to series-mode watch bindings.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Kind of filesystem change reported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// Options shared by the reactor core and its shell.
#[derive(Debug, Clone, Copy)]
pub struct ReactorOptions {
    /// Quiet period after the last change before a series binding fires.
    pub debounce: Duration,
}

impl Default for ReactorOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Events flowing into the reactor from the watcher, timers and runs.
#[derive(Debug, Clone)]
pub enum ReactorEvent {
    /// A file under the project root changed. `path` is project-relative
    /// with forward slashes.
    FileChanged { path: String, kind: ChangeKind },
    /// A debounce timer armed for `binding` elapsed.
    FlushDue { binding: BindingId, generation: u64 },
    /// A triggered run finished.
    RunFinished {
        binding: BindingId,
        trigger_id: u64,
        outcome: RunOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod outcome;
pub mod queue;
pub mod runner;
pub mod runtime;

pub use core::ReactorCore;
pub use event_handlers::{ReactorCommand, ReactorStep};
pub use outcome::{RunFailure, RunOutcome, TaskFailure};
pub use queue::BindingQueue;
pub use runner::PipelineRunner;
pub use runtime::Reactor;
