// src/watch/mod.rs

//! File watching.
//!
//! - [`patterns`] compiles watch / exclude globs and derives the directories
//!   that need a recursive watch.
//! - [`binding`] pairs a glob set with the graph it triggers.
//! - [`watcher`] wires up `notify` and forwards project-relative paths to the
//!   reactor.
//!
//! Nothing here decides *when* a trigger runs; debouncing and coalescing
//! live in the engine.

pub mod binding;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use binding::{BindingId, WatchBinding};
pub use patterns::{GlobMatcher, glob_base_dir, watch_roots};
pub use watcher::{WatcherHandle, spawn_watcher};
