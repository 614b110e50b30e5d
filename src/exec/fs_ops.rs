// src/exec/fs_ops.rs

//! In-process filesystem tasks (`builtin = "clean"` / `builtin = "copy"`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};

use crate::exec::action::{ActionFuture, RunContext, TaskAction};

/// Removes an output root. A missing directory counts as success.
#[derive(Debug, Clone)]
pub struct CleanAction {
    dir: PathBuf,
}

impl CleanAction {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TaskAction for CleanAction {
    fn run<'a>(&'a self, ctx: &'a RunContext) -> ActionFuture<'a> {
        Box::pin(async move {
            match tokio::fs::remove_dir_all(&self.dir).await {
                Ok(()) => {
                    info!(run_id = ctx.run_id, dir = ?self.dir, "removed output directory");
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(run_id = ctx.run_id, dir = ?self.dir, "nothing to clean");
                    Ok(())
                }
                Err(e) => Err(e).with_context(|| format!("removing {:?}", self.dir)),
            }
        })
    }

    fn describe(&self) -> String {
        format!("clean {}", self.dir.display())
    }
}

/// Recursively copies `from` into `to`, skipping excluded relative paths.
#[derive(Debug, Clone)]
pub struct CopyAction {
    from: PathBuf,
    to: PathBuf,
    exclude: GlobSet,
}

impl CopyAction {
    /// `exclude` globs are matched against paths relative to `from`.
    pub fn new(
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
        exclude: &[String],
    ) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pat in exclude {
            let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
            builder.add(glob);
        }
        Ok(Self {
            from: from.into(),
            to: to.into(),
            exclude: builder.build()?,
        })
    }
}

impl TaskAction for CopyAction {
    fn run<'a>(&'a self, ctx: &'a RunContext) -> ActionFuture<'a> {
        Box::pin(async move {
            let from = self.from.clone();
            let to = self.to.clone();
            let exclude = self.exclude.clone();

            let copied = tokio::task::spawn_blocking(move || copy_tree(&from, &to, &exclude))
                .await
                .context("copy worker panicked")??;

            info!(
                run_id = ctx.run_id,
                from = ?self.from,
                to = ?self.to,
                files = copied,
                "copied static files"
            );
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("copy {} -> {}", self.from.display(), self.to.display())
    }
}

fn copy_tree(from: &Path, to: &Path, exclude: &GlobSet) -> Result<usize> {
    let mut copied = 0;
    let mut stack = vec![from.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).with_context(|| format!("reading dir {:?}", dir))? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();
            let Ok(rel) = path.strip_prefix(from) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if exclude.is_match(&rel_str) {
                debug!(path = %rel_str, "excluded from copy");
                continue;
            }

            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_symlink() && path.is_dir() {
                // Linked directories may loop back into the tree.
                warn!(path = %rel_str, "skipping symlinked directory");
            } else if path.is_file() {
                let target = to.join(rel);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating dir {:?}", parent))?;
                }
                fs::copy(&path, &target)
                    .with_context(|| format!("copying {:?} to {:?}", path, target))?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
