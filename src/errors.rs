// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

/// Errors that stop sitepipe before (or outside of) task execution.
///
/// Task-level failures during a run are not errors in this sense; they are
/// reported as [`crate::engine::RunFailure`] values.
#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown task or group: {0}")]
    UnknownReference(String),

    #[error("Cycle detected between groups: {0}")]
    GroupCycle(String),

    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
