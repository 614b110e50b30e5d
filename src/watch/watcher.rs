// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Result;
use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{ChangeKind, ReactorEvent};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::watch_roots;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Directories being watched recursively.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

/// Map a notify event kind onto the changes the reactor cares about.
///
/// Access events and pure metadata changes are dropped.
pub fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

/// Watch the literal base directories of `patterns` under `root` and forward
/// every relevant change as `ReactorEvent::FileChanged`.
///
/// Paths are sent project-relative; glob matching happens in the reactor.
/// Base directories that don't exist yet are skipped with a warning.
pub fn spawn_watcher<'a>(
    root: impl Into<PathBuf>,
    patterns: impl IntoIterator<Item = &'a str>,
    reactor_tx: mpsc::Sender<ReactorEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // notify calls back on its own thread; hop into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("sitepipe: failed to forward file event: {err}");
                }
            }
            Err(err) => eprintln!("sitepipe: file watch error: {err}"),
        },
        Config::default(),
    )?;

    let mut roots = Vec::new();
    for rel in watch_roots(patterns) {
        let dir = root.join(&rel);
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "watch directory does not exist; skipping");
            continue;
        }
        watcher.watch(&dir, RecursiveMode::Recursive)?;
        roots.push(dir);
    }

    info!(roots = ?roots, "file watcher started");

    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let Some(kind) = classify(&event.kind) else {
                continue;
            };

            for path in &event.paths {
                let Some(rel) = relative_str(&async_root, path) else {
                    debug!(path = %path.display(), "event outside project root; ignoring");
                    continue;
                };
                if reactor_tx
                    .send(ReactorEvent::FileChanged { path: rel, kind })
                    .await
                    .is_err()
                {
                    debug!("reactor gone; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        roots,
    })
}
