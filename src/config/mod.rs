// src/config/mod.rs

//! Configuration loading.
//!
//! - [`model`] mirrors `Sitepipe.toml`.
//! - [`validate`] turns a `RawConfigFile` into a checked `ConfigFile`.
//! - [`loader`] reads files from disk.
//! - [`template`] expands `{out}` / `{mode}` / `{source}`.

pub mod loader;
pub mod model;
pub mod template;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{
    ConfigFile, ConfigSection, NodeSpec, RawConfigFile, ServerSection, TaskConfig, WatchConfig,
};
pub use template::TemplateVars;
