// src/engine/core.rs

//! Pure watch reactor state machine.
//!
//! The core consumes [`ReactorEvent`]s and produces [`ReactorCommand`]s for
//! the async shell (`engine::runtime::Reactor`). It owns no channels, timers
//! or processes, so every debounce and coalescing rule can be tested by
//! feeding events by hand.

use crate::engine::event_handlers::{
    ReactorStep, handle_file_changed, handle_flush_due, handle_run_finished,
};
use crate::engine::queue::BindingQueue;
use crate::engine::{ReactorEvent, ReactorOptions};
use crate::watch::binding::{BindingId, WatchBinding};

#[derive(Debug)]
pub struct ReactorCore {
    bindings: Vec<WatchBinding>,
    queues: Vec<BindingQueue>,
    options: ReactorOptions,
    next_trigger: u64,
}

impl ReactorCore {
    pub fn new(bindings: Vec<WatchBinding>, options: ReactorOptions) -> Self {
        let queues = bindings.iter().map(|b| BindingQueue::new(b.mode)).collect();
        Self {
            bindings,
            queues,
            options,
            next_trigger: 0,
        }
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    pub fn binding(&self, id: BindingId) -> Option<&WatchBinding> {
        self.bindings.get(id)
    }

    /// Trigger id of the run in flight for `id`, if any (for tests).
    pub fn in_flight(&self, id: BindingId) -> Option<u64> {
        self.queues.get(id).and_then(BindingQueue::in_flight)
    }

    /// True when no binding has a run in flight or pending work.
    pub fn is_idle(&self) -> bool {
        self.queues.iter().all(BindingQueue::is_idle)
    }

    /// Handle a single event, updating state and returning commands for the
    /// IO shell.
    pub fn step(&mut self, event: ReactorEvent) -> ReactorStep {
        match event {
            ReactorEvent::FileChanged { path, kind } => handle_file_changed(
                &self.bindings,
                &mut self.queues,
                self.options.debounce,
                &mut self.next_trigger,
                &path,
                kind,
            ),
            ReactorEvent::FlushDue {
                binding,
                generation,
            } => handle_flush_due(&mut self.queues, &mut self.next_trigger, binding, generation),
            ReactorEvent::RunFinished {
                binding,
                trigger_id,
                outcome,
            } => handle_run_finished(
                &self.bindings,
                &mut self.queues,
                &mut self.next_trigger,
                binding,
                trigger_id,
                outcome,
            ),
            ReactorEvent::ShutdownRequested => ReactorStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
