// tests/cli_pipeline.rs

//! End-to-end runs of `sitepipe::run` against temporary projects with real
//! shell commands.

mod common;
use crate::common::{TestResult, init_tracing};

use std::fs;
use std::path::Path;

use sitepipe::cli::{CliArgs, Command};
use sitepipe::errors::SitepipeError;
use sitepipe::types::BuildMode;

const CONFIG: &str = r#"
[config]
source_root = "source"
build_dir = "build"
dev_dir = "dev"

[task.clean]
builtin = "clean"

[task.copy-static]
builtin = "copy"
from = "{source}/static"
to = "{out}"
exclude = ["drafts/**"]

[task.pages]
cmd = "mkdir -p {out} && cp {source}/index.html {out}/index.html"

[task.mode-marker]
cmd = "mkdir -p {out} && echo {mode} > {out}/mode.txt"

[task.lint-js]
cmd = "test ! -f {source}/js/broken.js"
non_fatal_in = ["dev"]

[entry.build]
series = ["clean", "lint-js", { parallel = ["copy-static", "pages", "mode-marker"] }]

[entry.dev]
series = ["clean", "lint-js", { parallel = ["copy-static", "pages"] }]

[entry.lint]
parallel = ["lint-js"]
"#;

fn project(root: &Path) -> std::io::Result<()> {
    fs::write(root.join("Sitepipe.toml"), CONFIG)?;
    fs::create_dir_all(root.join("source/static/drafts"))?;
    fs::create_dir_all(root.join("source/js"))?;
    fs::write(root.join("source/index.html"), "<h1>hi</h1>")?;
    fs::write(root.join("source/static/robots.txt"), "User-agent: *")?;
    fs::write(root.join("source/static/drafts/wip.txt"), "wip")?;
    fs::write(root.join("source/js/app.js"), "console.log(1)")?;
    Ok(())
}

fn args(root: &Path, command: Command) -> CliArgs {
    CliArgs {
        config: root.join("Sitepipe.toml"),
        log_level: None,
        output_dir: None,
        dry_run: false,
        command,
    }
}

fn startup_error(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<SitepipeError>(), Some(SitepipeError::Startup(_)))
}

#[tokio::test]
async fn build_produces_output_tree() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    project(dir.path())?;

    sitepipe::run(args(dir.path(), Command::Build)).await?;

    let out = dir.path().join("build");
    assert_eq!(fs::read_to_string(out.join("index.html"))?, "<h1>hi</h1>");
    assert_eq!(fs::read_to_string(out.join("robots.txt"))?, "User-agent: *");
    assert_eq!(fs::read_to_string(out.join("mode.txt"))?.trim(), "build");
    assert!(!out.join("drafts/wip.txt").exists());
    assert!(!dir.path().join("dev").exists());
    Ok(())
}

#[tokio::test]
async fn failing_lint_stops_build_before_any_output() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    project(dir.path())?;
    fs::write(dir.path().join("source/js/broken.js"), "{")?;

    let err = sitepipe::run(args(dir.path(), Command::Build))
        .await
        .expect_err("lint failure must fail the build");

    assert!(format!("{err:#}").contains("lint-js"), "{err:#}");
    assert!(!dir.path().join("build").exists());
    Ok(())
}

#[tokio::test]
async fn lint_entry_fails_on_lint_errors() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    project(dir.path())?;

    sitepipe::run(args(dir.path(), Command::Lint)).await?;

    fs::write(dir.path().join("source/js/broken.js"), "{")?;
    assert!(sitepipe::run(args(dir.path(), Command::Lint)).await.is_err());
    Ok(())
}

#[tokio::test]
async fn lint_failures_are_tolerated_in_dev_mode() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    project(dir.path())?;
    fs::write(dir.path().join("source/js/broken.js"), "{")?;

    let dev_run = Command::Run {
        target: "dev".to_string(),
        mode: BuildMode::Dev,
    };
    sitepipe::run(args(dir.path(), dev_run)).await?;
    assert!(dir.path().join("dev/index.html").exists());
    Ok(())
}

#[tokio::test]
async fn run_single_task_with_output_override() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    project(dir.path())?;

    let mut a = args(
        dir.path(),
        Command::Run {
            target: "mode-marker".to_string(),
            mode: BuildMode::Dev,
        },
    );
    a.output_dir = Some("preview".to_string());
    sitepipe::run(a).await?;

    assert_eq!(
        fs::read_to_string(dir.path().join("preview/mode.txt"))?.trim(),
        "dev"
    );
    Ok(())
}

#[tokio::test]
async fn dry_run_executes_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    project(dir.path())?;

    let mut a = args(dir.path(), Command::Build);
    a.dry_run = true;
    sitepipe::run(a).await?;

    assert!(!dir.path().join("build").exists());
    Ok(())
}

#[tokio::test]
async fn unreadable_source_root_is_a_startup_failure() -> TestResult {
    let dir = tempfile::tempdir()?;
    project(dir.path())?;
    fs::remove_dir_all(dir.path().join("source"))?;

    let err = sitepipe::run(args(dir.path(), Command::Build))
        .await
        .expect_err("missing source root");
    assert!(startup_error(&err), "{err:#}");
    Ok(())
}

#[tokio::test]
async fn missing_config_is_a_startup_failure() -> TestResult {
    let dir = tempfile::tempdir()?;

    let err = sitepipe::run(args(dir.path(), Command::Build))
        .await
        .expect_err("missing config");
    assert!(startup_error(&err), "{err:#}");
    Ok(())
}

#[tokio::test]
async fn unknown_run_target_is_reported() -> TestResult {
    let dir = tempfile::tempdir()?;
    project(dir.path())?;

    let err = sitepipe::run(args(
        dir.path(),
        Command::Run {
            target: "deploy".to_string(),
            mode: BuildMode::Build,
        },
    ))
    .await
    .expect_err("unknown target");
    assert!(matches!(
        err.downcast_ref::<SitepipeError>(),
        Some(SitepipeError::UnknownReference(_))
    ));
    Ok(())
}

#[tokio::test]
async fn output_override_that_covers_sources_is_refused() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    project(dir.path())?;
    let project_root = dir.path().to_string_lossy().into_owned();

    for out in [".", "", "./", "source", "source/..", "..", project_root.as_str()] {
        let mut a = args(dir.path(), Command::Build);
        a.output_dir = Some(out.to_string());

        let err = sitepipe::run(a)
            .await
            .expect_err("unsafe output root must be rejected");
        assert!(
            matches!(err.downcast_ref::<SitepipeError>(), Some(SitepipeError::ConfigError(_))),
            "output dir {out:?}: {err:#}"
        );
        assert!(dir.path().join("source/index.html").exists(), "output dir {out:?}");
        assert!(dir.path().join("Sitepipe.toml").exists(), "output dir {out:?}");
    }
    Ok(())
}
