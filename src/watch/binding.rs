// src/watch/binding.rs

use std::sync::Arc;

use crate::compose::TaskNode;
use crate::types::{ReloadKind, WatchMode};
use crate::watch::patterns::GlobMatcher;

/// Index of a binding inside the reactor's binding list.
pub type BindingId = usize;

/// Glob-to-trigger mapping used by the watch reactor.
///
/// Bindings are independent: when globs of several bindings overlap, every
/// matching binding fires.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    pub label: String,
    pub matcher: GlobMatcher,
    pub trigger: Arc<TaskNode>,
    pub mode: WatchMode,
    pub reload: ReloadKind,
}

impl WatchBinding {
    pub fn new(
        label: impl Into<String>,
        matcher: GlobMatcher,
        trigger: TaskNode,
        mode: WatchMode,
        reload: ReloadKind,
    ) -> Self {
        Self {
            label: label.into(),
            matcher,
            trigger: Arc::new(trigger),
            mode,
            reload,
        }
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.matches(rel_path)
    }
}
