// src/reload/bridge.rs

use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::engine::RunOutcome;
use crate::reload::ReloadSink;
use crate::reload::message::ReloadMessage;
use crate::types::ReloadKind;

const DEFAULT_CAPACITY: usize = 64;

/// Broadcasts reload instructions to every connected dev-server client.
///
/// Cloning is cheap; all clones feed the same channel.
#[derive(Debug, Clone)]
pub struct ReloadBridge {
    tx: broadcast::Sender<ReloadMessage>,
}

impl Default for ReloadBridge {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ReloadBridge {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Broadcast `message`. Having no connected clients is not an error.
    pub fn send(&self, message: ReloadMessage) {
        match self.tx.send(message) {
            Ok(clients) => debug!(clients, "reload message broadcast"),
            Err(broadcast::error::SendError(message)) => {
                debug!(event = message.event_name(), "no reload clients connected");
            }
        }
    }
}

impl ReloadSink for ReloadBridge {
    fn notify(&self, source: &str, outcome: &RunOutcome, kind: ReloadKind) {
        if let Err(failure) = outcome {
            error!(
                source,
                failed = ?failure.failed_tasks(),
                error = %failure,
                "triggered run failed; browsers not reloaded"
            );
            return;
        }

        let message = match kind {
            ReloadKind::Full => ReloadMessage::Reload {
                source: source.to_string(),
            },
            ReloadKind::Styles => ReloadMessage::Css {
                source: source.to_string(),
            },
            ReloadKind::None => {
                debug!(source, "triggered run succeeded; binding does not reload");
                return;
            }
        };

        info!(source, event = message.event_name(), "notifying browsers");
        self.send(message);
    }
}
