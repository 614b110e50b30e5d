// src/config/template.rs

//! `{placeholder}` substitution for commands and paths.
//!
//! Supported placeholders:
//! - `{out}`: output root of the current mode
//! - `{mode}`: `build` or `dev`
//! - `{source}`: source root
//!
//! Shell-style `${VAR}` is left untouched so commands can still expand
//! environment variables.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::BuildMode;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$?)\{([A-Za-z_]+)\}").expect("placeholder regex is valid")
});

const KNOWN: &[&str] = &["out", "mode", "source"];

/// Values substituted into templates at graph-construction time.
#[derive(Debug, Clone)]
pub struct TemplateVars {
    pub out: String,
    pub mode: BuildMode,
    pub source: String,
}

impl TemplateVars {
    pub fn new(out: impl Into<String>, mode: BuildMode, source: impl Into<String>) -> Self {
        Self {
            out: out.into(),
            mode,
            source: source.into(),
        }
    }

    pub fn render(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| {
                let whole = caps[0].to_string();
                if !caps[1].is_empty() {
                    return whole;
                }
                match &caps[2] {
                    "out" => self.out.clone(),
                    "mode" => self.mode.as_str().to_string(),
                    "source" => self.source.clone(),
                    _ => whole,
                }
            })
            .into_owned()
    }
}

/// Return the first unknown placeholder in `template`, if any.
pub fn unknown_placeholder(template: &str) -> Option<String> {
    PLACEHOLDER
        .captures_iter(template)
        .filter(|caps| caps[1].is_empty())
        .map(|caps| caps[2].to_string())
        .find(|name| !KNOWN.contains(&name.as_str()))
}
