#![allow(dead_code)]

use sitepipe::config::model::{ConfigSection, ServerSection};
use sitepipe::config::{ConfigFile, NodeSpec, RawConfigFile, TaskConfig, WatchConfig};
use sitepipe::errors::Result;
use sitepipe::types::{Builtin, BuildMode, ReloadKind, WatchMode};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                server: ServerSection::default(),
                task: Default::default(),
                group: Default::default(),
                entry: Default::default(),
                watch: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_group(mut self, name: &str, spec: NodeSpec) -> Self {
        self.config.group.insert(name.to_string(), spec);
        self
    }

    pub fn with_entry(mut self, name: &str, spec: NodeSpec) -> Self {
        self.config.entry.insert(name.to_string(), spec);
        self
    }

    pub fn with_watch(mut self, watch: WatchConfig) -> Self {
        self.config.watch.push(watch);
        self
    }

    pub fn with_dirs(mut self, source: &str, build: &str, dev: &str) -> Self {
        self.config.config.source_root = source.to_string();
        self.config.config.build_dir = build.to_string();
        self.config.config.dev_dir = dev.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn cmd(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    pub fn builtin(builtin: Builtin) -> Self {
        Self {
            task: TaskConfig {
                builtin: Some(builtin),
                ..TaskConfig::default()
            },
        }
    }

    pub fn build_cmd(mut self, cmd: &str) -> Self {
        self.task.build_cmd = Some(cmd.to_string());
        self
    }

    pub fn dev_cmd(mut self, cmd: &str) -> Self {
        self.task.dev_cmd = Some(cmd.to_string());
        self
    }

    pub fn only(mut self, mode: BuildMode) -> Self {
        self.task.only = Some(mode);
        self
    }

    pub fn non_fatal_in(mut self, mode: BuildMode) -> Self {
        self.task.non_fatal_in.push(mode);
        self
    }

    pub fn copy_paths(mut self, from: &str, to: &str) -> Self {
        self.task.from = Some(from.to_string());
        self.task.to = Some(to.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.task.exclude.push(pattern.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builder for `[[watch]]` entries.
pub struct WatchConfigBuilder {
    watch: WatchConfig,
}

impl WatchConfigBuilder {
    pub fn new(glob: &str, run: NodeSpec) -> Self {
        Self {
            watch: WatchConfig {
                name: None,
                glob: vec![glob.to_string()],
                exclude: Vec::new(),
                run,
                mode: WatchMode::Series,
                reload: ReloadKind::Full,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.watch.name = Some(name.to_string());
        self
    }

    pub fn glob(mut self, glob: &str) -> Self {
        self.watch.glob.push(glob.to_string());
        self
    }

    pub fn exclude(mut self, glob: &str) -> Self {
        self.watch.exclude.push(glob.to_string());
        self
    }

    pub fn mode(mut self, mode: WatchMode) -> Self {
        self.watch.mode = mode;
        self
    }

    pub fn reload(mut self, reload: ReloadKind) -> Self {
        self.watch.reload = reload;
        self
    }

    pub fn build(self) -> WatchConfig {
        self.watch
    }
}

/// `NodeSpec` shorthands.
pub fn r(name: &str) -> NodeSpec {
    NodeSpec::reference(name)
}

pub fn s(children: &[&str]) -> NodeSpec {
    NodeSpec::series(children.iter().map(|c| r(c)).collect())
}

pub fn p(children: &[&str]) -> NodeSpec {
    NodeSpec::parallel(children.iter().map(|c| r(c)).collect())
}
