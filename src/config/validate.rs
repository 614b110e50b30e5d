// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, NodeSpec, RawConfigFile, TaskConfig};
use crate::config::template::unknown_placeholder;
use crate::errors::{Result, SitepipeError};
use crate::types::{Builtin, BuildMode};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    validate_names(cfg)?;
    validate_references(cfg)?;
    validate_group_cycles(cfg)?;
    validate_watches(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SitepipeError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.config;

    for (key, value) in [
        ("source_root", &c.source_root),
        ("build_dir", &c.build_dir),
        ("dev_dir", &c.dev_dir),
    ] {
        if value.trim().is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "[config].{key} must not be empty"
            )));
        }
    }

    if c.build_dir == c.dev_dir {
        return Err(SitepipeError::ConfigError(format!(
            "[config].build_dir and dev_dir must differ (both are '{}')",
            c.build_dir
        )));
    }

    for (key, value) in [("build_dir", &c.build_dir), ("dev_dir", &c.dev_dir)] {
        check_output_root(&format!("[config].{key}"), value, &c.source_root, Path::new(""))?;
    }

    for dir in &cfg.server.base_dirs {
        check_placeholders("[server].base_dirs", dir)?;
    }

    Ok(())
}

/// Reject an output root that `clean` must never remove: empty, the project
/// root or one of its parents, or the source root or one of its parents.
///
/// The check is lexical. With an empty `project_root` only relative outputs
/// can be judged; absolute ones are checked again once the root is known.
pub fn check_output_root(owner: &str, out: &str, source_root: &str, project_root: &Path) -> Result<()> {
    let root = normalize(project_root);
    let out_path = normalize(&root.join(out));
    let source = normalize(&root.join(source_root));

    let above_root = out_path
        .components()
        .all(|c| matches!(c, Component::ParentDir));
    if out.trim().is_empty() || above_root || root.starts_with(&out_path) {
        return Err(SitepipeError::ConfigError(format!(
            "{owner} '{out}' resolves to the project root or above it; refusing to use it as an output directory"
        )));
    }
    if source.starts_with(&out_path) {
        return Err(SitepipeError::ConfigError(format!(
            "{owner} '{out}' contains the source root '{source_root}'; refusing to use it as an output directory"
        )));
    }
    Ok(())
}

/// Resolve `.` and `..` without touching the filesystem. Leading `..` of a
/// relative path is kept.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        validate_task(name, task)?;
    }
    Ok(())
}

fn validate_task(name: &str, task: &TaskConfig) -> Result<()> {
    let has_cmd = task.cmd.is_some() || task.build_cmd.is_some() || task.dev_cmd.is_some();

    match (task.builtin, has_cmd) {
        (Some(_), true) => {
            return Err(SitepipeError::ConfigError(format!(
                "task '{name}' sets both `builtin` and a command"
            )));
        }
        (None, false) => {
            return Err(SitepipeError::ConfigError(format!(
                "task '{name}' needs `cmd` (or `build_cmd`/`dev_cmd`) or `builtin`"
            )));
        }
        (None, true) => {
            for mode in [BuildMode::Build, BuildMode::Dev] {
                if task.enabled_in(mode) && task.command_for(mode).is_none() {
                    return Err(SitepipeError::ConfigError(format!(
                        "task '{name}' has no command for mode '{mode}'"
                    )));
                }
            }
        }
        (Some(Builtin::Copy), false) => {
            if task.from.is_none() || task.to.is_none() {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' uses builtin copy but is missing `from` or `to`"
                )));
            }
            for pattern in &task.exclude {
                Glob::new(pattern).map_err(|e| {
                    SitepipeError::ConfigError(format!(
                        "task '{name}' has invalid exclude glob '{pattern}': {e}"
                    ))
                })?;
            }
        }
        (Some(Builtin::Clean), false) => {}
    }

    for template in task.templates() {
        check_placeholders(&format!("task '{name}'"), template)?;
    }

    Ok(())
}

fn check_placeholders(owner: &str, template: &str) -> Result<()> {
    if let Some(unknown) = unknown_placeholder(template) {
        return Err(SitepipeError::ConfigError(format!(
            "{owner} uses unknown placeholder '{{{unknown}}}' (expected {{out}}, {{mode}} or {{source}})"
        )));
    }
    Ok(())
}

fn validate_names(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.group.keys() {
        if cfg.task.contains_key(name) {
            return Err(SitepipeError::ConfigError(format!(
                "'{name}' is defined both as a task and as a group"
            )));
        }
    }
    Ok(())
}

fn validate_references(cfg: &RawConfigFile) -> Result<()> {
    let known = |name: &str| cfg.task.contains_key(name) || cfg.group.contains_key(name);

    let mut owners: Vec<(String, &NodeSpec)> = Vec::new();
    owners.extend(cfg.group.iter().map(|(n, s)| (format!("group '{n}'"), s)));
    owners.extend(cfg.entry.iter().map(|(n, s)| (format!("entry '{n}'"), s)));
    owners.extend(
        cfg.watch
            .iter()
            .map(|w| (format!("watch '{}'", w.label()), &w.run)),
    );

    for (owner, spec) in owners {
        for name in spec.references() {
            if !known(name) {
                return Err(SitepipeError::UnknownReference(format!(
                    "{owner} references '{name}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_group_cycles(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: referenced group -> referencing group.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.group.keys() {
        graph.add_node(name.as_str());
    }

    for (name, spec) in cfg.group.iter() {
        for referenced in spec.references() {
            if cfg.group.contains_key(referenced) {
                graph.add_edge(referenced, name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SitepipeError::GroupCycle(format!(
            "cycle detected between groups involving '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_watches(cfg: &RawConfigFile) -> Result<()> {
    for watch in &cfg.watch {
        let label = watch.label();
        if watch.glob.is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "watch '{label}' must list at least one glob"
            )));
        }
        for pattern in watch.glob.iter().chain(watch.exclude.iter()) {
            Glob::new(pattern).map_err(|e| {
                SitepipeError::ConfigError(format!(
                    "watch '{label}' has invalid glob '{pattern}': {e}"
                ))
            })?;
        }
    }
    Ok(())
}
