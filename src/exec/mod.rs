// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`action`] defines `Task`, the `TaskAction` trait and the per-run
//!   `RunContext`, plus closure-backed and failure-tolerant actions.
//! - [`shell`] runs external tools with `tokio::process::Command`.
//! - [`fs_ops`] implements the in-process `clean` and `copy` builtins.

pub mod action;
pub mod fs_ops;
pub mod shell;

pub use action::{ActionFuture, FnAction, RunContext, Task, TaskAction, TolerantAction};
pub use fs_ops::{CleanAction, CopyAction};
pub use shell::ShellAction;
