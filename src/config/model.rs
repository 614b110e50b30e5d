// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{Builtin, BuildMode, ReloadKind, WatchMode};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// source_root = "source"
///
/// [task.compile-styles]
/// cmd = "sass source/sass:{out}/css"
///
/// [group.styles]
/// parallel = ["compile-styles", "lint-styles"]
///
/// [entry.build]
/// series = ["clean", "styles"]
///
/// [[watch]]
/// glob = ["source/sass/**/*.scss"]
/// run = "styles"
/// reload = "styles"
/// ```
///
/// All sections are optional at the syntax level; [`ConfigFile`] enforces
/// the semantic rules.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub server: ServerSection,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Named compositions from `[group.<name>]`.
    #[serde(default)]
    pub group: BTreeMap<String, NodeSpec>,

    /// Entry points (`build`, `dev`, `lint`, ...) from `[entry.<name>]`.
    #[serde(default)]
    pub entry: BTreeMap<String, NodeSpec>,

    /// Watch bindings from `[[watch]]`, used by `dev`.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on every reference resolving and groups being acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub server: ServerSection,
    pub task: BTreeMap<String, TaskConfig>,
    pub group: BTreeMap<String, NodeSpec>,
    pub entry: BTreeMap<String, NodeSpec>,
    pub watch: Vec<WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            server: raw.server,
            task: raw.task,
            group: raw.group,
            entry: raw.entry,
            watch: raw.watch,
        }
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn groups(&self) -> &BTreeMap<String, NodeSpec> {
        &self.group
    }

    pub fn entry(&self, name: &str) -> Option<&NodeSpec> {
        self.entry.get(name)
    }

    pub fn watches(&self) -> &[WatchConfig] {
        &self.watch
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Root of the source tree; must exist and be readable at startup.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Output root for `build`.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Output root for `dev`.
    #[serde(default = "default_dev_dir")]
    pub dev_dir: String,

    /// Trailing debounce window for `series` watch bindings.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_source_root() -> String {
    "source".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_dev_dir() -> String {
    "dev".to_string()
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            build_dir: default_build_dir(),
            dev_dir: default_dev_dir(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl ConfigSection {
    /// Output root for the given mode, before any CLI override.
    pub fn output_dir(&self, mode: BuildMode) -> &str {
        match mode {
            BuildMode::Build => &self.build_dir,
            BuildMode::Dev => &self.dev_dir,
        }
    }
}

/// `[server]` section (dev server).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directories served in lookup order; placeholders allowed.
    #[serde(default = "default_base_dirs")]
    pub base_dirs: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_base_dirs() -> Vec<String> {
    vec![
        "{source}/static".to_string(),
        "{out}".to_string(),
        "{source}".to_string(),
    ]
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_dirs: default_base_dirs(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Free-form text shown by `--dry-run`.
    #[serde(default)]
    pub description: Option<String>,

    /// Command line used in every mode unless overridden.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Override of `cmd` for `build`.
    #[serde(default)]
    pub build_cmd: Option<String>,

    /// Override of `cmd` for `dev`.
    #[serde(default)]
    pub dev_cmd: Option<String>,

    /// Filesystem task implemented in-process instead of a command.
    #[serde(default)]
    pub builtin: Option<Builtin>,

    /// `builtin = "copy"`: source directory.
    #[serde(default)]
    pub from: Option<String>,

    /// `builtin = "copy"`: destination directory.
    #[serde(default)]
    pub to: Option<String>,

    /// `builtin = "copy"`: globs (relative to `from`) that are not copied.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Restrict the task to one mode; omitted from graphs of the other.
    #[serde(default)]
    pub only: Option<BuildMode>,

    /// Modes in which a failure is logged but does not fail the graph.
    #[serde(default)]
    pub non_fatal_in: Vec<BuildMode>,
}

impl TaskConfig {
    /// Whether the task takes part in graphs composed for `mode`.
    pub fn enabled_in(&self, mode: BuildMode) -> bool {
        self.only.is_none_or(|only| only == mode)
    }

    /// Effective command for `mode`, if this is a command task.
    pub fn command_for(&self, mode: BuildMode) -> Option<&str> {
        let specific = match mode {
            BuildMode::Build => self.build_cmd.as_deref(),
            BuildMode::Dev => self.dev_cmd.as_deref(),
        };
        specific.or(self.cmd.as_deref())
    }

    /// Whether a failure of this task fails the enclosing graph in `mode`.
    pub fn fatal_in(&self, mode: BuildMode) -> bool {
        !self.non_fatal_in.contains(&mode)
    }

    /// All template-bearing strings, for placeholder validation.
    pub(crate) fn templates(&self) -> impl Iterator<Item = &str> {
        [
            self.cmd.as_deref(),
            self.build_cmd.as_deref(),
            self.dev_cmd.as_deref(),
            self.from.as_deref(),
            self.to.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// A composition as written in TOML.
///
/// - `"name"`: reference to a task or a group.
/// - `{ series = [...] }`: run the children one after another.
/// - `{ parallel = [...] }`: run the children concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Ref(String),
    Series(SeriesSpec),
    Parallel(ParallelSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesSpec {
    pub series: Vec<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelSpec {
    pub parallel: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn reference(name: impl Into<String>) -> Self {
        NodeSpec::Ref(name.into())
    }

    pub fn series(children: Vec<NodeSpec>) -> Self {
        NodeSpec::Series(SeriesSpec { series: children })
    }

    pub fn parallel(children: Vec<NodeSpec>) -> Self {
        NodeSpec::Parallel(ParallelSpec { parallel: children })
    }

    /// Every name referenced anywhere inside this spec.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(spec) = stack.pop() {
            match spec {
                NodeSpec::Ref(name) => out.push(name.as_str()),
                NodeSpec::Series(s) => stack.extend(s.series.iter()),
                NodeSpec::Parallel(p) => stack.extend(p.parallel.iter()),
            }
        }
        out
    }
}

/// `[[watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Label used in logs; defaults to the first glob.
    #[serde(default)]
    pub name: Option<String>,

    /// Globs relative to the project root.
    pub glob: Vec<String>,

    /// Globs that veto a match.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// What to run when the binding fires.
    pub run: NodeSpec,

    #[serde(default)]
    pub mode: WatchMode,

    #[serde(default)]
    pub reload: ReloadKind,
}

impl WatchConfig {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.glob.first().cloned())
            .unwrap_or_else(|| "watch".to_string())
    }
}
