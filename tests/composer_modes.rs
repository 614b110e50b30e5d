// tests/composer_modes.rs

mod common;
use crate::common::TestResult;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder, WatchConfigBuilder, p, r, s};

use sitepipe::compose::{Composer, TaskNode};
use sitepipe::config::{ConfigFile, NodeSpec};
use sitepipe::errors::SitepipeError;
use sitepipe::types::{Builtin, BuildMode, ReloadKind, WatchMode};

fn site_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task("clean", TaskConfigBuilder::builtin(Builtin::Clean).build())
        .with_task(
            "compile-styles",
            TaskConfigBuilder::cmd("sass {source}/sass/style.scss {out}/css/style.css")
                .build_cmd("sass --style=compressed {source}/sass/style.scss {out}/css/style.min.css")
                .build(),
        )
        .with_task("build-js", TaskConfigBuilder::cmd("esbuild --outdir={out}/js").build())
        .with_task(
            "optimize-images",
            TaskConfigBuilder::cmd("imagemin {out}/img")
                .only(BuildMode::Build)
                .build(),
        )
        .with_task(
            "lint-js",
            TaskConfigBuilder::cmd("eslint {source}/js")
                .non_fatal_in(BuildMode::Dev)
                .build(),
        )
        .with_group("assets", p(&["compile-styles", "build-js", "optimize-images"]))
        .with_entry(
            "build",
            NodeSpec::series(vec![r("clean"), r("lint-js"), r("assets")]),
        )
        .with_watch(
            WatchConfigBuilder::new("source/sass/**/*.scss", r("compile-styles"))
                .name("styles")
                .reload(ReloadKind::Styles)
                .build(),
        )
        .with_watch(
            WatchConfigBuilder::new("source/img/icons/*.svg", s(&["optimize-images"]))
                .mode(WatchMode::AllEvents)
                .build(),
        )
        .build()
}

fn leaf_descriptions(node: &TaskNode) -> Vec<String> {
    match node {
        TaskNode::Leaf(t) => vec![format!("{}: {}", t.name(), t.describe())],
        TaskNode::Series(c) | TaskNode::Parallel(c) => c.iter().flat_map(leaf_descriptions).collect(),
    }
}

#[test]
fn build_only_tasks_vanish_from_dev_graphs() -> TestResult {
    let cfg = site_config();

    let build = Composer::new(&cfg, BuildMode::Build, "/site", None)?.entry("build")?;
    assert_eq!(
        build.task_names(),
        vec!["clean", "lint-js", "compile-styles", "build-js", "optimize-images"]
    );

    let dev = Composer::new(&cfg, BuildMode::Dev, "/site", None)?.entry("build")?;
    assert_eq!(dev.task_names(), vec!["clean", "lint-js", "compile-styles", "build-js"]);
    Ok(())
}

#[test]
fn mode_specific_commands_and_placeholders_are_resolved_up_front() -> TestResult {
    let cfg = site_config();

    let build = Composer::new(&cfg, BuildMode::Build, "/site", None)?;
    let desc = build.task("compile-styles").unwrap().describe();
    assert_eq!(
        desc,
        "sh: sass --style=compressed source/sass/style.scss build/css/style.min.css"
    );

    let dev = Composer::new(&cfg, BuildMode::Dev, "/site", Some("tmp/preview"))?;
    assert_eq!(dev.output_dir(), "tmp/preview");
    let desc = dev.task("compile-styles").unwrap().describe();
    assert_eq!(desc, "sh: sass source/sass/style.scss tmp/preview/css/style.css");
    Ok(())
}

#[test]
fn non_fatal_tasks_are_wrapped_only_in_their_modes() -> TestResult {
    let cfg = site_config();

    let dev = Composer::new(&cfg, BuildMode::Dev, "/site", None)?;
    assert!(dev.task("lint-js").unwrap().describe().ends_with("(non-fatal)"));

    let build = Composer::new(&cfg, BuildMode::Build, "/site", None)?;
    assert!(!build.task("lint-js").unwrap().describe().ends_with("(non-fatal)"));
    Ok(())
}

#[test]
fn clean_targets_the_mode_output_root() -> TestResult {
    let cfg = site_config();
    let dev = Composer::new(&cfg, BuildMode::Dev, "/site", None)?;
    let descs = leaf_descriptions(&dev.target("clean")?);
    assert_eq!(descs, vec!["clean: clean /site/dev".to_string()]);
    Ok(())
}

#[test]
fn composition_with_only_disabled_children_is_empty() -> TestResult {
    let cfg = site_config();
    let dev = Composer::new(&cfg, BuildMode::Dev, "/site", None)?;

    let node = dev.compose(&s(&["optimize-images"]))?;
    assert!(node.task_names().is_empty());
    Ok(())
}

#[test]
fn targets_resolve_entries_groups_and_tasks() -> TestResult {
    let cfg = site_config();
    let c = Composer::new(&cfg, BuildMode::Build, "/site", None)?;

    assert_eq!(c.target("build")?.task_names().len(), 5);
    assert_eq!(c.target("assets")?.task_names().len(), 3);
    assert_eq!(c.target("build-js")?.task_names(), vec!["build-js"]);
    assert!(matches!(
        c.target("deploy"),
        Err(SitepipeError::UnknownReference(_))
    ));
    assert!(matches!(
        c.entry("assets"),
        Err(SitepipeError::UnknownReference(_))
    ));
    Ok(())
}

#[test]
fn watch_bindings_carry_mode_reload_and_trigger() -> TestResult {
    let cfg = site_config();
    let bindings = Composer::new(&cfg, BuildMode::Dev, "/site", None)?.watch_bindings()?;

    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].label, "styles");
    assert_eq!(bindings[0].reload, ReloadKind::Styles);
    assert_eq!(bindings[0].mode, WatchMode::Series);
    assert!(bindings[0].matches("source/sass/blocks/header.scss"));
    assert!(!bindings[0].matches("source/js/app.js"));
    assert_eq!(bindings[0].trigger.task_names(), vec!["compile-styles"]);

    // Label defaults to the first glob.
    assert_eq!(bindings[1].label, "source/img/icons/*.svg");
    assert_eq!(bindings[1].mode, WatchMode::AllEvents);
    assert!(bindings[1].trigger.task_names().is_empty());
    Ok(())
}

#[test]
fn graph_is_rendered_for_dry_run() -> TestResult {
    let cfg = site_config();
    let tree = Composer::new(&cfg, BuildMode::Build, "/site", None)?
        .entry("build")?
        .render_tree();

    assert!(tree.starts_with("series:\n"));
    assert!(tree.contains("  parallel:\n"));
    assert!(tree.contains("    - build-js (sh: esbuild --outdir=build/js)"));
    Ok(())
}

#[test]
fn shipped_config_keeps_linters_out_of_the_dev_reload_path() -> TestResult {
    let raw = sitepipe::config::parse_str(include_str!("../Sitepipe.toml"))?;
    let cfg = ConfigFile::try_from(raw)?;

    for linter in ["lint-js", "lint-styles"] {
        let dev = Composer::new(&cfg, BuildMode::Dev, "/site", None)?;
        let dev_desc = dev.task(linter).map(|t| t.describe()).unwrap_or_default();
        assert!(dev_desc.ends_with("(non-fatal)"), "{linter} in dev: {dev_desc}");

        let build = Composer::new(&cfg, BuildMode::Build, "/site", None)?;
        let build_desc = build.task(linter).map(|t| t.describe()).unwrap_or_default();
        assert!(!build_desc.ends_with("(non-fatal)"), "{linter} in build: {build_desc}");
    }
    Ok(())
}
