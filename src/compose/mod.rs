// src/compose/mod.rs

//! Task composition.
//!
//! - [`node`] holds the `TaskNode` tree and the `series` / `parallel`
//!   combinators.
//! - [`composer`] resolves `[group]`, `[entry]` and `[[watch]]` specs from
//!   the configuration into `TaskNode`s for one build mode.

pub mod composer;
pub mod node;

pub use composer::Composer;
pub use node::{TaskNode, parallel, series};
