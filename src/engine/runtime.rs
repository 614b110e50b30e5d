// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::core::ReactorCore;
use crate::engine::runner::PipelineRunner;
use crate::engine::{ReactorCommand, ReactorEvent, ReactorOptions};
use crate::errors::Result;
use crate::reload::ReloadSink;
use crate::watch::binding::WatchBinding;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Async shell around [`ReactorCore`].
///
/// Feeds events into the core and carries out its commands: debounce timers
/// become delayed `FlushDue` events, runs are spawned on the
/// [`PipelineRunner`] and report back with `RunFinished`, and outcomes are
/// handed to the [`ReloadSink`].
///
/// Timers and runs live in a `JoinSet`; when the reactor stops they are
/// aborted, which also kills any child processes they own.
pub struct Reactor<S: ReloadSink> {
    core: ReactorCore,
    runner: Arc<PipelineRunner>,
    sink: S,
    event_tx: mpsc::Sender<ReactorEvent>,
    event_rx: mpsc::Receiver<ReactorEvent>,
    inflight: JoinSet<()>,
}

impl<S: ReloadSink> fmt::Debug for Reactor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<S: ReloadSink> Reactor<S> {
    pub fn new(
        bindings: Vec<WatchBinding>,
        options: ReactorOptions,
        runner: Arc<PipelineRunner>,
        sink: S,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            core: ReactorCore::new(bindings, options),
            runner,
            sink,
            event_tx,
            event_rx,
            inflight: JoinSet::new(),
        }
    }

    /// Handle for the watcher and the shutdown signal to feed events in.
    pub fn sender(&self) -> mpsc::Sender<ReactorEvent> {
        self.event_tx.clone()
    }

    /// Main event loop. Returns once `ShutdownRequested` is received.
    pub async fn run(mut self) -> Result<()> {
        info!(bindings = self.core.bindings().len(), "watch reactor started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "reactor received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            // Reap finished timers and runs.
            while let Some(joined) = self.inflight.try_join_next() {
                if let Err(err) = joined {
                    if err.is_panic() {
                        warn!(error = %err, "reactor task panicked");
                    }
                }
            }

            if !step.keep_running {
                info!("shutdown requested; stopping watch reactor");
                break;
            }
        }

        self.inflight.abort_all();
        info!("watch reactor exiting");
        Ok(())
    }

    fn execute_command(&mut self, command: ReactorCommand) {
        match command {
            ReactorCommand::ArmFlush {
                binding,
                generation,
                after,
            } => {
                let tx = self.event_tx.clone();
                self.inflight.spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx
                        .send(ReactorEvent::FlushDue {
                            binding,
                            generation,
                        })
                        .await;
                });
            }
            ReactorCommand::StartRun {
                binding,
                trigger_id,
                changed,
            } => {
                let Some(spec) = self.core.binding(binding) else {
                    warn!(binding, "run requested for unknown binding");
                    return;
                };
                info!(binding = %spec.label, trigger_id, ?changed, "change detected; running");

                let node = Arc::clone(&spec.trigger);
                let label = spec.label.clone();
                let runner = Arc::clone(&self.runner);
                let tx = self.event_tx.clone();
                self.inflight.spawn(async move {
                    let outcome = runner.run(&node, &label).await;
                    let _ = tx
                        .send(ReactorEvent::RunFinished {
                            binding,
                            trigger_id,
                            outcome,
                        })
                        .await;
                });
            }
            ReactorCommand::Notify {
                binding,
                reload,
                outcome,
            } => {
                let label = self
                    .core
                    .binding(binding)
                    .map(|b| b.label.as_str())
                    .unwrap_or("<unknown>");
                self.sink.notify(label, &outcome, reload);
            }
        }
    }
}
