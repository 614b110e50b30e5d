// src/watch/path_utils.rs

//! Path helpers for turning watcher events into project-relative paths.

use std::path::{Path, PathBuf};

/// Express `path` relative to `root` with forward slashes.
///
/// `root` is expected to be canonical. Event paths normally start with it
/// already; when they don't (symlinked temp dirs on macOS), the path is
/// canonicalized. Removed files can't be canonicalized, so their parent
/// directory is canonicalized instead and the file name re-attached.
///
/// Returns `None` for paths outside `root`, and for `root` itself.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Some(rel) = strip(root, path) {
        return Some(rel);
    }

    let canonical = path.canonicalize().ok().or_else(|| canonical_via_parent(path))?;
    strip(root, &canonical)
}

fn strip(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.to_string_lossy().replace('\\', "/"))
}

fn canonical_via_parent(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}
