// src/lib.rs

pub mod cli;
pub mod compose;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod reload;
pub mod server;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::compose::{Composer, TaskNode};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{PipelineRunner, Reactor, ReactorEvent, ReactorOptions};
use crate::errors::SitepipeError;
use crate::reload::ReloadBridge;
use crate::server::{DevServerConfig, start_server};
use crate::watch::{WatchBinding, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, composes the requested entry for the
/// subcommand's build mode, then either runs it once (`build`, `lint`,
/// `run`) or runs it and keeps serving and watching (`dev`).
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let cfg = load_config(&config_path)?;
    let project_root = config_root_dir(&config_path);
    check_source_root(&project_root, &cfg)?;

    let mode = args.command.mode();
    let composer = Composer::new(&cfg, mode, &project_root, args.output_dir.as_deref())?;
    info!(%mode, out = composer.output_dir(), root = %project_root.display(), "configuration loaded");

    match &args.command {
        Command::Build => run_once(&composer, composer.entry("build")?, "build", args.dry_run).await,
        Command::Lint => run_once(&composer, composer.entry("lint")?, "lint", args.dry_run).await,
        Command::Run { target, .. } => {
            run_once(&composer, composer.target(target)?, target, args.dry_run).await
        }
        Command::Dev { port, host } => {
            let overrides = ServerOverrides {
                port: *port,
                host: host.clone(),
            };
            run_dev(&cfg, &composer, overrides, args.dry_run).await
        }
    }
}

#[derive(Debug, Default)]
struct ServerOverrides {
    port: Option<u16>,
    host: Option<String>,
}

async fn run_once(composer: &Composer<'_>, node: TaskNode, label: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        print_dry_run(composer, label, &node, &[]);
        return Ok(());
    }

    let runner = PipelineRunner::new();
    runner
        .run(&node, label)
        .await
        .with_context(|| format!("`{label}` failed"))
}

/// Initial `dev` pass, then dev server + watch reactor until Ctrl-C.
///
/// A failed initial pass is logged; serving and watching start regardless
/// so the next save can fix things.
async fn run_dev(
    cfg: &ConfigFile,
    composer: &Composer<'_>,
    overrides: ServerOverrides,
    dry_run: bool,
) -> Result<()> {
    let node = composer.entry("dev")?;
    let bindings = composer.watch_bindings()?;

    if dry_run {
        print_dry_run(composer, "dev", &node, &bindings);
        return Ok(());
    }

    let runner = Arc::new(PipelineRunner::new());
    if let Err(failure) = runner.run(&node, "dev").await {
        warn!(error = %failure, "initial dev pass failed; serving and watching anyway");
    }

    let bridge = ReloadBridge::default();
    let mut server_cfg =
        DevServerConfig::from_section(&cfg.server, composer.vars(), composer.project_root());
    if let Some(port) = overrides.port {
        server_cfg.port = port;
    }
    if let Some(host) = overrides.host {
        server_cfg.host = host;
    }
    let server = start_server(server_cfg, bridge.clone())
        .await
        .map_err(|e| SitepipeError::Startup(format!("cannot start dev server: {e}")))?;

    let patterns: Vec<String> = bindings
        .iter()
        .flat_map(|b| b.matcher.patterns().iter().cloned())
        .collect();
    let options = ReactorOptions {
        debounce: Duration::from_millis(cfg.config.debounce_ms),
    };
    let reactor = Reactor::new(bindings, options, runner, bridge);

    let _watcher = spawn_watcher(
        composer.project_root(),
        patterns.iter().map(String::as_str),
        reactor.sender(),
    )
    .map_err(|e| SitepipeError::Startup(format!("cannot start file watcher: {e:#}")))?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = reactor.sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(ReactorEvent::ShutdownRequested).await;
        });
    }

    info!(addr = %server.addr(), "dev mode ready; press Ctrl+C to stop");
    let result = reactor.run().await;
    server.abort();
    result.map_err(Into::into)
}

fn load_config(config_path: &Path) -> Result<ConfigFile> {
    if !config_path.is_file() {
        return Err(SitepipeError::Startup(format!(
            "config file {} not found",
            config_path.display()
        ))
        .into());
    }
    Ok(load_and_validate(config_path)?)
}

/// The project root is the directory holding the config file; a bare file
/// name means the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// The source root must exist and be readable before anything runs.
fn check_source_root(project_root: &Path, cfg: &ConfigFile) -> Result<(), SitepipeError> {
    let source = project_root.join(&cfg.config.source_root);
    std::fs::read_dir(&source).map(drop).map_err(|e| {
        SitepipeError::Startup(format!(
            "source root {} is not readable: {e}",
            source.display()
        ))
    })
}

fn print_dry_run(composer: &Composer<'_>, label: &str, node: &TaskNode, bindings: &[WatchBinding]) {
    println!("sitepipe dry-run");
    println!("  mode = {}", composer.mode());
    println!("  output_dir = {}", composer.output_dir());
    println!();

    println!("{label}:");
    print!("{}", indent(&node.render_tree(), 1));

    if !bindings.is_empty() {
        println!();
        println!("watch ({}):", bindings.len());
        for b in bindings {
            println!(
                "  - {} [{}, reload = {:?}]",
                b.label,
                b.mode.as_str(),
                b.reload
            );
            println!("      glob: {:?}", b.matcher.patterns());
            print!("{}", indent(&b.trigger.render_tree(), 3));
        }
    }

    debug!("dry-run complete (no execution)");
}

fn indent(text: &str, depth: usize) -> String {
    let pad = "  ".repeat(depth);
    text.lines().map(|l| format!("{pad}{l}\n")).collect()
}
