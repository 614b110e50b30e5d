// src/compose/composer.rs

//! Turns validated configuration into runnable graphs for one build mode.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::compose::node::TaskNode;
use crate::config::model::{ConfigFile, NodeSpec, TaskConfig};
use crate::config::template::TemplateVars;
use crate::config::validate::check_output_root;
use crate::errors::{Result, SitepipeError};
use crate::exec::{CleanAction, CopyAction, ShellAction, Task, TaskAction, TolerantAction};
use crate::types::{Builtin, BuildMode};
use crate::watch::binding::WatchBinding;
use crate::watch::patterns::GlobMatcher;

/// Graph builder bound to one configuration and one [`BuildMode`].
///
/// The mode and the output root are fixed at construction; every task is
/// built once with its placeholders already expanded, so task bodies never
/// consult the mode themselves.
#[derive(Debug)]
pub struct Composer<'a> {
    cfg: &'a ConfigFile,
    mode: BuildMode,
    project_root: PathBuf,
    vars: TemplateVars,
    /// Tasks enabled in `mode`. Disabled tasks are absent.
    registry: BTreeMap<String, Task>,
}

impl<'a> Composer<'a> {
    /// `output_dir` overrides the mode's configured output root. An output
    /// root that would make `clean` remove the project or its sources is a
    /// `ConfigError`.
    pub fn new(
        cfg: &'a ConfigFile,
        mode: BuildMode,
        project_root: impl Into<PathBuf>,
        output_dir: Option<&str>,
    ) -> Result<Self> {
        let project_root = project_root.into();
        let out = output_dir
            .map(str::to_string)
            .unwrap_or_else(|| cfg.config.output_dir(mode).to_string());
        let anchored = std::path::absolute(&project_root).unwrap_or_else(|_| project_root.clone());
        check_output_root("output directory", &out, &cfg.config.source_root, &anchored)?;
        let vars = TemplateVars::new(out, mode, cfg.config.source_root.clone());

        let mut registry = BTreeMap::new();
        for (name, tc) in cfg.tasks().iter() {
            if !tc.enabled_in(mode) {
                debug!(task = %name, %mode, "task disabled in this mode");
                continue;
            }
            let task = build_task(name, tc, mode, &vars, &project_root)?;
            registry.insert(name.clone(), task);
        }

        Ok(Self {
            cfg,
            mode,
            project_root,
            vars,
            registry,
        })
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Output root, relative to the project root unless absolute.
    pub fn output_dir(&self) -> &str {
        &self.vars.out
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn vars(&self) -> &TemplateVars {
        &self.vars
    }

    /// Look up an enabled task by name.
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.registry.get(name)
    }

    /// Compose a spec. References to tasks disabled in this mode vanish;
    /// a composition left without children succeeds immediately.
    pub fn compose(&self, spec: &NodeSpec) -> Result<TaskNode> {
        let mut visiting = Vec::new();
        Ok(self
            .compose_inner(spec, &mut visiting)?
            .unwrap_or_else(TaskNode::empty))
    }

    /// Compose `[entry.<name>]`.
    pub fn entry(&self, name: &str) -> Result<TaskNode> {
        let spec = self
            .cfg
            .entry(name)
            .ok_or_else(|| SitepipeError::UnknownReference(format!("no [entry.{name}] defined")))?;
        self.compose(spec)
    }

    /// Compose any named target: an entry point, a group or a single task.
    pub fn target(&self, name: &str) -> Result<TaskNode> {
        if self.cfg.entry(name).is_some() {
            return self.entry(name);
        }
        if self.cfg.groups().contains_key(name) || self.cfg.tasks().contains_key(name) {
            return self.compose(&NodeSpec::reference(name));
        }
        Err(SitepipeError::UnknownReference(name.to_string()))
    }

    /// Build the watch bindings declared in `[[watch]]`.
    pub fn watch_bindings(&self) -> Result<Vec<WatchBinding>> {
        let mut bindings = Vec::with_capacity(self.cfg.watches().len());
        for wc in self.cfg.watches() {
            let label = wc.label();
            let matcher = GlobMatcher::new(&wc.glob, &wc.exclude)
                .map_err(|e| SitepipeError::ConfigError(format!("watch '{label}': {e:#}")))?;
            let trigger = self.compose(&wc.run)?;
            bindings.push(WatchBinding::new(label, matcher, trigger, wc.mode, wc.reload));
        }
        Ok(bindings)
    }

    /// `visiting` is the chain of groups being expanded; seeing a group twice
    /// means a reference cycle.
    fn compose_inner(
        &self,
        spec: &NodeSpec,
        visiting: &mut Vec<String>,
    ) -> Result<Option<TaskNode>> {
        match spec {
            NodeSpec::Ref(name) => self.compose_ref(name, visiting),
            NodeSpec::Series(s) => {
                let children = self.compose_children(&s.series, visiting)?;
                Ok((!children.is_empty()).then_some(TaskNode::Series(children)))
            }
            NodeSpec::Parallel(p) => {
                let children = self.compose_children(&p.parallel, visiting)?;
                Ok((!children.is_empty()).then_some(TaskNode::Parallel(children)))
            }
        }
    }

    fn compose_children(
        &self,
        specs: &[NodeSpec],
        visiting: &mut Vec<String>,
    ) -> Result<Vec<TaskNode>> {
        let mut children = Vec::with_capacity(specs.len());
        for child in specs {
            if let Some(node) = self.compose_inner(child, visiting)? {
                children.push(node);
            }
        }
        Ok(children)
    }

    fn compose_ref(&self, name: &str, visiting: &mut Vec<String>) -> Result<Option<TaskNode>> {
        if let Some(task) = self.registry.get(name) {
            return Ok(Some(TaskNode::Leaf(task.clone())));
        }
        if self.cfg.tasks().contains_key(name) {
            // Known task, disabled in this mode.
            return Ok(None);
        }

        let Some(group) = self.cfg.groups().get(name) else {
            return Err(SitepipeError::UnknownReference(name.to_string()));
        };

        if visiting.iter().any(|v| v == name) {
            return Err(SitepipeError::GroupCycle(format!(
                "group '{name}' references itself through {visiting:?}"
            )));
        }

        visiting.push(name.to_string());
        let node = self.compose_inner(group, visiting);
        visiting.pop();
        node
    }
}

fn build_task(
    name: &str,
    tc: &TaskConfig,
    mode: BuildMode,
    vars: &TemplateVars,
    project_root: &Path,
) -> Result<Task> {
    let action: Arc<dyn TaskAction> = match tc.builtin {
        Some(Builtin::Clean) => Arc::new(CleanAction::new(project_root.join(&vars.out))),
        Some(Builtin::Copy) => {
            let (Some(from), Some(to)) = (tc.from.as_deref(), tc.to.as_deref()) else {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' uses builtin copy but is missing `from` or `to`"
                )));
            };
            Arc::new(CopyAction::new(
                project_root.join(vars.render(from)),
                project_root.join(vars.render(to)),
                &tc.exclude,
            )?)
        }
        None => {
            let cmd = tc.command_for(mode).ok_or_else(|| {
                SitepipeError::ConfigError(format!("task '{name}' has no command for mode '{mode}'"))
            })?;
            Arc::new(ShellAction::new(name, vars.render(cmd), project_root))
        }
    };

    let action: Arc<dyn TaskAction> = if tc.fatal_in(mode) {
        action
    } else {
        Arc::new(TolerantAction::new(name, action))
    };

    Ok(Task::from_action(name, action))
}
