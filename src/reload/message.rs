// src/reload/message.rs

use serde::Serialize;

/// Instruction pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Reload the whole page.
    Reload { source: String },
    /// Re-fetch stylesheets in place without a page reload.
    Css { source: String },
}

impl ReloadMessage {
    /// SSE event name the client script listens for.
    pub fn event_name(&self) -> &'static str {
        match self {
            ReloadMessage::Reload { .. } => "reload",
            ReloadMessage::Css { .. } => "css",
        }
    }

    pub fn source(&self) -> &str {
        match self {
            ReloadMessage::Reload { source } | ReloadMessage::Css { source } => source,
        }
    }

    /// JSON payload for the SSE `data:` field.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
