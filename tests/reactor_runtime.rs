// tests/reactor_runtime.rs

//! The async reactor shell driven with virtual time.

mod common;
use crate::common::stubs::{ExecLog, RecordingSink, Step, StubTask, slow_task};
use crate::common::{TestResult, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use sitepipe::compose::TaskNode;
use sitepipe::engine::{ChangeKind, PipelineRunner, Reactor, ReactorEvent, ReactorOptions};
use sitepipe::reload::{ReloadBridge, ReloadMessage, ReloadSink};
use sitepipe::types::{ReloadKind, WatchMode};
use sitepipe::watch::{GlobMatcher, WatchBinding};

const DEBOUNCE: Duration = Duration::from_millis(200);

fn binding(
    label: &str,
    glob: &str,
    trigger: TaskNode,
    mode: WatchMode,
    reload: ReloadKind,
) -> WatchBinding {
    let matcher = GlobMatcher::new(&[glob.to_string()], &[]).unwrap();
    WatchBinding::new(label, matcher, trigger, mode, reload)
}

fn spawn_reactor<S: ReloadSink>(
    bindings: Vec<WatchBinding>,
    sink: S,
) -> (
    mpsc::Sender<ReactorEvent>,
    tokio::task::JoinHandle<sitepipe::errors::Result<()>>,
) {
    let reactor = Reactor::new(
        bindings,
        ReactorOptions { debounce: DEBOUNCE },
        Arc::new(PipelineRunner::new()),
        sink,
    );
    let tx = reactor.sender();
    (tx, tokio::spawn(reactor.run()))
}

async fn change(tx: &mpsc::Sender<ReactorEvent>, path: &str) -> TestResult {
    tx.send(ReactorEvent::FileChanged {
        path: path.to_string(),
        kind: ChangeKind::Modified,
    })
    .await?;
    Ok(())
}

async fn shutdown(
    tx: mpsc::Sender<ReactorEvent>,
    handle: tokio::task::JoinHandle<sitepipe::errors::Result<()>>,
) -> TestResult {
    tx.send(ReactorEvent::ShutdownRequested).await?;
    with_timeout(handle).await??;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn trailing_debounce_collapses_a_burst_into_one_run() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let sink = RecordingSink::new();
    let (tx, handle) = spawn_reactor(
        vec![binding(
            "styles",
            "source/sass/**/*.scss",
            slow_task("compile-styles", Duration::from_millis(50), &log).into(),
            WatchMode::Series,
            ReloadKind::Styles,
        )],
        sink.clone(),
    );

    // Changes 150ms apart keep pushing the window out.
    change(&tx, "source/sass/a.scss").await?;
    sleep(Duration::from_millis(150)).await;
    change(&tx, "source/sass/b.scss").await?;
    sleep(Duration::from_millis(150)).await;
    change(&tx, "source/sass/c.scss").await?;
    sleep(Duration::from_millis(150)).await;
    assert!(log.steps().is_empty(), "window still open: {:?}", log.steps());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(log.start_count("compile-styles"), 1);

    let notes = sink.notifications();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].succeeded);
    assert_eq!(notes[0].kind, ReloadKind::Styles);
    assert_eq!(notes[0].source, "styles");

    shutdown(tx, handle).await
}

#[tokio::test(start_paused = true)]
async fn all_events_binding_runs_once_per_event_without_overlap() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let sink = RecordingSink::new();
    let (tx, handle) = spawn_reactor(
        vec![binding(
            "icons",
            "source/img/icons/*.svg",
            slow_task("stack-svg", Duration::from_millis(100), &log).into(),
            WatchMode::AllEvents,
            ReloadKind::Full,
        )],
        sink.clone(),
    );

    change(&tx, "source/img/icons/a.svg").await?;
    change(&tx, "source/img/icons/b.svg").await?;
    change(&tx, "source/img/icons/c.svg").await?;
    sleep(Duration::from_secs(2)).await;

    assert_eq!(log.start_count("stack-svg"), 3);
    let steps = log.steps();
    for pair in steps.chunks(2) {
        assert!(
            matches!(pair, [Step::Started(_), Step::Finished(_)]),
            "runs overlapped: {steps:?}"
        );
    }
    assert_eq!(sink.len(), 3);

    shutdown(tx, handle).await
}

#[tokio::test(start_paused = true)]
async fn changes_during_a_run_produce_exactly_one_follow_up() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let sink = RecordingSink::new();
    let (tx, handle) = spawn_reactor(
        vec![binding(
            "scripts",
            "source/js/**/*.js",
            slow_task("build-js", Duration::from_secs(1), &log).into(),
            WatchMode::Series,
            ReloadKind::Full,
        )],
        sink.clone(),
    );

    change(&tx, "source/js/app.js").await?;
    sleep(Duration::from_millis(300)).await;
    assert_eq!(log.start_count("build-js"), 1);

    // Two separate windows close while the first run is still going.
    change(&tx, "source/js/a.js").await?;
    sleep(Duration::from_millis(300)).await;
    change(&tx, "source/js/b.js").await?;
    sleep(Duration::from_millis(300)).await;
    assert_eq!(log.start_count("build-js"), 1);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(log.start_count("build-js"), 2);
    assert_eq!(sink.len(), 2);

    shutdown(tx, handle).await
}

#[tokio::test(start_paused = true)]
async fn failed_trigger_is_reported_and_watching_continues() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let sink = RecordingSink::new();
    let (tx, handle) = spawn_reactor(
        vec![binding(
            "scripts",
            "source/js/**/*.js",
            StubTask::new("lint-js", &log).failing().build().into(),
            WatchMode::Series,
            ReloadKind::Full,
        )],
        sink.clone(),
    );

    change(&tx, "source/js/app.js").await?;
    sleep(Duration::from_secs(1)).await;
    change(&tx, "source/js/app.js").await?;
    sleep(Duration::from_secs(1)).await;

    let notes = sink.notifications();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| !n.succeeded));
    assert_eq!(notes[0].failed_tasks, vec!["lint-js".to_string()]);

    shutdown(tx, handle).await
}

#[tokio::test(start_paused = true)]
async fn bridge_sends_css_on_success_and_nothing_on_failure() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let bridge = ReloadBridge::new(16);
    let mut rx = bridge.subscribe();

    let (tx, handle) = spawn_reactor(
        vec![
            binding(
                "styles",
                "source/sass/**/*.scss",
                slow_task("compile-styles", Duration::from_millis(10), &log).into(),
                WatchMode::Series,
                ReloadKind::Styles,
            ),
            binding(
                "scripts",
                "source/js/**/*.js",
                StubTask::new("lint-js", &log).failing().build().into(),
                WatchMode::Series,
                ReloadKind::Full,
            ),
        ],
        bridge.clone(),
    );

    change(&tx, "source/js/app.js").await?;
    sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err(), "failed run must not reload");

    change(&tx, "source/sass/style.scss").await?;
    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        rx.try_recv()?,
        ReloadMessage::Css {
            source: "styles".to_string()
        }
    );

    shutdown(tx, handle).await
}

#[tokio::test(start_paused = true)]
async fn panicking_task_fails_the_run_and_the_binding_keeps_firing() -> TestResult {
    init_tracing();
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let task = sitepipe::exec::Task::from_fn("build-js", move || {
        let call = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        async move {
            if call == 0 {
                panic!("bundler crashed");
            }
            Ok(())
        }
    });
    let sink = RecordingSink::new();
    let (tx, handle) = spawn_reactor(
        vec![binding(
            "scripts",
            "source/scripts/**/*.js",
            task.into(),
            WatchMode::Series,
            ReloadKind::Full,
        )],
        sink.clone(),
    );

    for file in ["a.js", "b.js", "c.js"] {
        change(&tx, &format!("source/scripts/{file}")).await?;
        sleep(Duration::from_secs(1)).await;
    }

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    let notes = sink.notifications();
    assert_eq!(notes.len(), 3);
    assert!(!notes[0].succeeded);
    assert_eq!(notes[0].failed_tasks, vec!["build-js".to_string()]);
    assert!(notes[1].succeeded);
    assert!(notes[2].succeeded);

    shutdown(tx, handle).await
}
