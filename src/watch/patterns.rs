// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Compiled watch/exclude glob patterns for a single binding.
///
/// Patterns are relative to the project root; callers pass relative paths
/// with forward slashes (e.g. `"source/sass/blocks/header.scss"`).
#[derive(Clone)]
pub struct GlobMatcher {
    patterns: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for GlobMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobMatcher")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl GlobMatcher {
    pub fn new(watch: &[String], exclude: &[String]) -> Result<Self> {
        let watch_set = build_globset(watch).context("building watch globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };
        Ok(Self {
            patterns: watch.to_vec(),
            watch_set,
            exclude_set,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the relative path is watched and not excluded.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet. `*` does not cross `/`; use `**` for that.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Literal directory prefix of a glob: everything before the first
/// component containing a glob metacharacter.
///
/// `"source/sass/**/*.scss"` -> `"source/sass"`, `"source/*.html"` ->
/// `"source"`, `"*.md"` -> `""`.
pub fn glob_base_dir(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let mut components = pattern.split('/').peekable();

    while let Some(component) = components.next() {
        if component.contains(['*', '?', '[', '{']) {
            break;
        }
        // The last literal component of a pattern is a file name, not a dir.
        if components.peek().is_none() {
            break;
        }
        if !component.is_empty() && component != "." {
            base.push(component);
        }
    }

    base
}

/// Distinct directories to watch for a set of globs.
///
/// Identical roots collapse to one entry, and roots nested inside another
/// root are dropped because the parent is watched recursively.
pub fn watch_roots<'a, I>(patterns: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut roots: Vec<PathBuf> = patterns.into_iter().map(glob_base_dir).collect();
    roots.sort();
    roots.dedup();

    let mut out: Vec<PathBuf> = Vec::new();
    for root in roots {
        if !out.iter().any(|kept| is_within(&root, kept)) {
            out.push(root);
        }
    }
    out
}

fn is_within(path: &Path, parent: &Path) -> bool {
    parent.as_os_str().is_empty() || path.starts_with(parent)
}
