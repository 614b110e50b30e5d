// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;

use crate::types::BuildMode;

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build, watch and serve a static site from a declarative task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Its directory is the project root.
    #[arg(long, global = true, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override the output root of the selected mode.
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Parse + validate, print the composed graph, but don't run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the `build` entry once with production settings.
    Build,
    /// Run the `dev` entry, then serve and watch until interrupted.
    Dev {
        /// Port for the dev server (overrides `[server].port`).
        #[arg(long)]
        port: Option<u16>,
        /// Host for the dev server (overrides `[server].host`).
        #[arg(long)]
        host: Option<String>,
    },
    /// Run the `lint` entry once; fails if any linter fails.
    Lint,
    /// Run a single entry, group or task.
    Run {
        /// Entry, group or task name.
        target: String,
        /// Build mode the target is composed for.
        #[arg(long, default_value = "dev")]
        mode: BuildMode,
    },
}

impl Command {
    /// Build mode selected by this subcommand.
    ///
    /// `lint` composes in build mode so linters stay fatal.
    pub fn mode(&self) -> BuildMode {
        match self {
            Command::Build | Command::Lint => BuildMode::Build,
            Command::Dev { .. } => BuildMode::Dev,
            Command::Run { mode, .. } => *mode,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
