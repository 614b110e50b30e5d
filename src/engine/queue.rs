// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::types::WatchMode;

/// Pending work for one watch binding.
///
/// Semantics depend on the binding's [`WatchMode`]:
///
/// - `Series`: changed paths collect in an open debounce *window*. Each new
///   change bumps the window generation (trailing debounce); only a flush
///   carrying the latest generation closes it. A closed window becomes the
///   *ready* batch. If a run is in flight, further closed windows merge into
///   that same ready batch, so any number of changes during a run produce
///   exactly one follow-up run.
/// - `AllEvents`: each change is queued individually and produces exactly
///   one run, in arrival order.
///
/// At most one run per binding is in flight at a time.
#[derive(Debug)]
pub struct BindingQueue {
    mode: WatchMode,
    in_flight: Option<u64>,
    window: BTreeSet<String>,
    generation: u64,
    ready: Option<BTreeSet<String>>,
    events: VecDeque<String>,
}

impl BindingQueue {
    pub fn new(mode: WatchMode) -> Self {
        Self {
            mode,
            in_flight: None,
            window: BTreeSet::new(),
            generation: 0,
            ready: None,
            events: VecDeque::new(),
        }
    }

    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    /// Trigger id of the run currently in flight, if any.
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// True when nothing is running, buffered or waiting for a flush.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
            && self.window.is_empty()
            && self.ready.is_none()
            && self.events.is_empty()
    }

    /// Record one changed path.
    ///
    /// Returns the window generation to arm a flush timer for (`Series`),
    /// or `None` when no timer is needed (`AllEvents`).
    pub fn record_change(&mut self, path: &str) -> Option<u64> {
        match self.mode {
            WatchMode::Series => {
                self.window.insert(path.to_string());
                self.generation += 1;
                debug!(
                    path,
                    generation = self.generation,
                    batched = self.window.len(),
                    "change added to debounce window"
                );
                Some(self.generation)
            }
            WatchMode::AllEvents => {
                self.events.push_back(path.to_string());
                debug!(path, queued = self.events.len(), "change queued as its own run");
                None
            }
        }
    }

    /// Close the debounce window if `generation` is the latest one.
    ///
    /// Returns false for stale flushes (a newer change re-armed the window).
    pub fn close_window(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.window.is_empty() {
            return false;
        }

        let batch = std::mem::take(&mut self.window);
        match self.ready.as_mut() {
            Some(ready) => {
                ready.extend(batch);
                debug!(
                    batched = ready.len(),
                    "coalesced window into pending follow-up run"
                );
            }
            None => self.ready = Some(batch),
        }
        true
    }

    /// Take the next run's changed paths if nothing is in flight.
    pub fn take_next(&mut self) -> Option<Vec<String>> {
        if self.in_flight.is_some() {
            return None;
        }
        match self.mode {
            WatchMode::Series => self.ready.take().map(|set| set.into_iter().collect()),
            WatchMode::AllEvents => self.events.pop_front().map(|path| vec![path]),
        }
    }

    pub fn mark_started(&mut self, trigger_id: u64) {
        self.in_flight = Some(trigger_id);
    }

    /// Returns false if `trigger_id` is not the run in flight.
    pub fn mark_finished(&mut self, trigger_id: u64) -> bool {
        if self.in_flight == Some(trigger_id) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }
}
