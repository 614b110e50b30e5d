// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Which pipeline flavour the process was started for.
///
/// Decided once at startup from the subcommand and never mutated afterwards.
/// The composer receives it explicitly; task bodies never look it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Optimised one-shot output into the build root.
    Build,
    /// Fast output into the dev root, followed by server + watch.
    Dev,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Build => "build",
            BuildMode::Dev => "dev",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "build" => Ok(BuildMode::Build),
            "dev" => Ok(BuildMode::Dev),
            other => Err(format!(
                "invalid build mode: {other} (expected \"build\" or \"dev\")"
            )),
        }
    }
}

/// How a watch binding turns filesystem events into runs.
///
/// - `Series`: events are debounced per binding and coalesced into batches;
///   each batch produces one run (default).
/// - `AllEvents`: every matching event produces exactly one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatchMode {
    Series,
    AllEvents,
}

impl WatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchMode::Series => "series",
            WatchMode::AllEvents => "all-events",
        }
    }
}

impl Default for WatchMode {
    fn default() -> Self {
        WatchMode::Series
    }
}

/// What connected browsers should do after a successful triggered run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    /// Full page reload.
    Full,
    /// Re-fetch stylesheets in place.
    Styles,
    /// Do not signal clients at all.
    None,
}

impl Default for ReloadKind {
    fn default() -> Self {
        ReloadKind::Full
    }
}

/// Filesystem-implemented tasks that need no external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Builtin {
    /// Remove the output root of the current mode.
    Clean,
    /// Copy `from` into `to`, honouring `exclude` globs.
    Copy,
}
