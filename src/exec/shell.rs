// src/exec/shell.rs

//! External tool invocation through the platform shell.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::engine::TaskName;
use crate::exec::action::{ActionFuture, RunContext, TaskAction};

/// Runs one command line via `sh -c` (or `cmd /C` on Windows).
///
/// Only the exit status is inspected. Output lines are forwarded to the log
/// so linter and compiler messages stay visible.
#[derive(Debug, Clone)]
pub struct ShellAction {
    task: TaskName,
    cmd: String,
    cwd: PathBuf,
}

impl ShellAction {
    pub fn new(task: impl Into<TaskName>, cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            task: task.into(),
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    async fn run_inner(&self, ctx: &RunContext) -> Result<()> {
        info!(
            task = %self.task,
            run_id = ctx.run_id,
            cmd = %self.cmd,
            "starting task process"
        );

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        // In-flight tools are never killed by the scheduler; kill_on_drop only
        // matters when the whole process is shutting down.
        cmd.current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", self.task))?;

        let stdout_pump = child.stdout.take().map(|stdout| {
            let task = self.task.clone();
            let run_id = ctx.run_id;
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(task = %task, run_id, "{}", line);
                }
            })
        });

        let stderr_pump = child.stderr.take().map(|stderr| {
            let task = self.task.clone();
            let run_id = ctx.run_id;
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(task = %task, run_id, "{}", line);
                }
            })
        });

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of task '{}'", self.task))?;

        for pump in [stdout_pump, stderr_pump].into_iter().flatten() {
            if let Err(e) = pump.await {
                debug!(task = %self.task, error = %e, "output reader ended abnormally");
            }
        }

        let code = status.code().unwrap_or(-1);
        debug!(
            task = %self.task,
            run_id = ctx.run_id,
            exit_code = code,
            "task process exited"
        );

        if !status.success() {
            bail!("`{}` exited with code {}", self.cmd, code);
        }
        Ok(())
    }
}

impl TaskAction for ShellAction {
    fn run<'a>(&'a self, ctx: &'a RunContext) -> ActionFuture<'a> {
        Box::pin(self.run_inner(ctx))
    }

    fn describe(&self) -> String {
        format!("sh: {}", self.cmd)
    }
}
