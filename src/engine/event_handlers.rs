// src/engine/event_handlers.rs

//! Event handling logic for the reactor core.

use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::queue::BindingQueue;
use crate::engine::{ChangeKind, RunOutcome};
use crate::types::ReloadKind;
use crate::watch::binding::{BindingId, WatchBinding};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum ReactorCommand {
    /// Deliver `FlushDue { binding, generation }` after `after`.
    ArmFlush {
        binding: BindingId,
        generation: u64,
        after: Duration,
    },
    /// Run the binding's trigger graph.
    StartRun {
        binding: BindingId,
        trigger_id: u64,
        changed: Vec<String>,
    },
    /// Report a finished run to the reload sink.
    Notify {
        binding: BindingId,
        reload: ReloadKind,
        outcome: RunOutcome,
    },
}

/// Decision returned by the core after handling a single `ReactorEvent`.
#[derive(Debug, Clone, Default)]
pub struct ReactorStep {
    pub commands: Vec<ReactorCommand>,
    /// Whether the outer reactor loop should keep running.
    pub keep_running: bool,
}

impl ReactorStep {
    pub(crate) fn continue_with(commands: Vec<ReactorCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Start the binding's next run if it is idle and has work ready.
pub(crate) fn try_start(
    queue: &mut BindingQueue,
    binding: BindingId,
    next_trigger: &mut u64,
) -> Option<ReactorCommand> {
    let changed = queue.take_next()?;
    *next_trigger += 1;
    let trigger_id = *next_trigger;
    queue.mark_started(trigger_id);
    debug!(binding, trigger_id, ?changed, "starting triggered run");
    Some(ReactorCommand::StartRun {
        binding,
        trigger_id,
        changed,
    })
}

/// Route one changed path to every binding whose globs match it.
///
/// Series bindings (re)arm their debounce timer; all-events bindings start
/// a run right away if they are idle.
pub fn handle_file_changed(
    bindings: &[WatchBinding],
    queues: &mut [BindingQueue],
    debounce: Duration,
    next_trigger: &mut u64,
    path: &str,
    kind: ChangeKind,
) -> ReactorStep {
    let mut commands = Vec::new();
    let mut matched = 0usize;

    for (id, (binding, queue)) in bindings.iter().zip(queues.iter_mut()).enumerate() {
        if !binding.matches(path) {
            continue;
        }
        matched += 1;
        debug!(path, ?kind, binding = %binding.label, "change matched watch binding");

        match queue.record_change(path) {
            Some(generation) => commands.push(ReactorCommand::ArmFlush {
                binding: id,
                generation,
                after: debounce,
            }),
            None => commands.extend(try_start(queue, id, next_trigger)),
        }
    }

    if matched == 0 {
        debug!(path, ?kind, "change matched no watch binding; ignoring");
    }

    ReactorStep::continue_with(commands)
}

/// A debounce timer elapsed. Stale generations are ignored.
pub fn handle_flush_due(
    queues: &mut [BindingQueue],
    next_trigger: &mut u64,
    binding: BindingId,
    generation: u64,
) -> ReactorStep {
    let Some(queue) = queues.get_mut(binding) else {
        warn!(binding, "flush for unknown binding; ignoring");
        return ReactorStep::continue_with(Vec::new());
    };

    if !queue.close_window(generation) {
        debug!(binding, generation, "stale debounce flush; ignoring");
        return ReactorStep::continue_with(Vec::new());
    }

    ReactorStep::continue_with(try_start(queue, binding, next_trigger).into_iter().collect())
}

/// A run finished: report it, then start whatever queued up meanwhile.
///
/// Failures never stop the reactor; they are reported like any other
/// outcome and the binding stays armed.
pub fn handle_run_finished(
    bindings: &[WatchBinding],
    queues: &mut [BindingQueue],
    next_trigger: &mut u64,
    binding: BindingId,
    trigger_id: u64,
    outcome: RunOutcome,
) -> ReactorStep {
    let (Some(spec), Some(queue)) = (bindings.get(binding), queues.get_mut(binding)) else {
        warn!(binding, trigger_id, "completion for unknown binding; ignoring");
        return ReactorStep::continue_with(Vec::new());
    };

    if !queue.mark_finished(trigger_id) {
        warn!(
            binding = %spec.label,
            trigger_id,
            "completion for a run that is not in flight; ignoring"
        );
        return ReactorStep::continue_with(Vec::new());
    }

    let mut commands = vec![ReactorCommand::Notify {
        binding,
        reload: spec.reload,
        outcome,
    }];
    commands.extend(try_start(queue, binding, next_trigger));

    ReactorStep::continue_with(commands)
}
