// src/reload/mod.rs

//! Dev reload bridge.
//!
//! The watch reactor reports every finished run to a [`ReloadSink`]. The
//! production sink is [`ReloadBridge`], which turns successful runs into
//! [`ReloadMessage`]s broadcast to connected browsers. Failed runs never
//! produce a message.

pub mod bridge;
pub mod message;

pub use bridge::ReloadBridge;
pub use message::ReloadMessage;

use crate::engine::RunOutcome;
use crate::types::ReloadKind;

/// Receives the outcome of every watch-triggered run.
pub trait ReloadSink: Send + Sync + 'static {
    /// `source` is the label of the watch binding that ran.
    fn notify(&self, source: &str, outcome: &RunOutcome, kind: ReloadKind);
}
