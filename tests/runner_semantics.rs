// tests/runner_semantics.rs

mod common;
use crate::common::stubs::{ExecLog, Step, StubTask, failing_task, ok_task, slow_task};
use crate::common::{TestResult, init_tracing, with_timeout};

use std::time::Duration;

use sitepipe::compose::{TaskNode, parallel, series};
use sitepipe::engine::{PipelineRunner, RunFailure};

#[tokio::test(start_paused = true)]
async fn series_runs_children_in_order() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let node = series([
        slow_task("a", Duration::from_millis(30), &log),
        ok_task("b", &log),
        slow_task("c", Duration::from_millis(10), &log),
    ]);

    let runner = PipelineRunner::new();
    with_timeout(runner.run(&node, "test")).await?;

    assert_eq!(
        log.steps(),
        vec![
            Step::Started("a".into()),
            Step::Finished("a".into()),
            Step::Started("b".into()),
            Step::Finished("b".into()),
            Step::Started("c".into()),
            Step::Finished("c".into()),
        ]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn series_stops_at_first_failure_and_propagates_it() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let node = series([
        ok_task("a", &log),
        failing_task("b", &log),
        ok_task("c", &log),
    ]);

    let runner = PipelineRunner::new();
    let err = with_timeout(runner.run(&node, "test"))
        .await
        .expect_err("series with a failing child must fail");

    match err {
        RunFailure::Task(f) => assert_eq!(f.task, "b"),
        other => panic!("expected the child's failure unchanged, got {other:?}"),
    }
    assert_eq!(log.started(), vec!["a", "b"]);
    assert_eq!(log.start_count("c"), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn parallel_starts_all_children_before_any_finishes() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let node = parallel([
        slow_task("a", Duration::from_millis(50), &log),
        slow_task("b", Duration::from_millis(20), &log),
        slow_task("c", Duration::from_millis(10), &log),
    ]);

    let runner = PipelineRunner::new();
    with_timeout(runner.run(&node, "test")).await?;

    let steps = log.steps();
    let first_finish = steps
        .iter()
        .position(|s| matches!(s, Step::Finished(_)))
        .expect("something finished");
    assert_eq!(first_finish, 3, "all three must start first: {steps:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn parallel_waits_for_siblings_of_a_failed_child() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let node = parallel([
        failing_task("fast-fail", &log),
        slow_task("slow", Duration::from_millis(100), &log),
    ]);

    let runner = PipelineRunner::new();
    let err = with_timeout(runner.run(&node, "test"))
        .await
        .expect_err("parallel with a failing child must fail");

    assert!(matches!(err, RunFailure::Composition(_)));
    assert_eq!(err.failed_tasks(), vec!["fast-fail"]);
    // Completion is only reported after the slow sibling is done.
    assert!(log.steps().contains(&Step::Finished("slow".into())));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn parallel_failure_lists_every_failed_child() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let node = parallel([
        failing_task("lint-js", &log),
        ok_task("build-js", &log),
        StubTask::new("lint-styles", &log)
            .delay(Duration::from_millis(5))
            .failing()
            .build(),
    ]);

    let runner = PipelineRunner::new();
    let err = with_timeout(runner.run(&node, "lint"))
        .await
        .expect_err("two linters failed");

    let mut failed = err.failed_tasks();
    failed.sort();
    assert_eq!(failed, vec!["lint-js", "lint-styles"]);
    assert!(err.to_string().contains("2 task(s) failed"));
    Ok(())
}

#[tokio::test]
async fn empty_compositions_succeed_immediately() -> TestResult {
    let runner = PipelineRunner::new();
    runner.run(&series(Vec::<TaskNode>::new()), "empty").await?;
    runner.run(&parallel(Vec::<TaskNode>::new()), "empty").await?;
    runner.run(&TaskNode::empty(), "empty").await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn nested_composition_mirrors_build_pipeline() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    // clean, then (styles | scripts | assets), then minify
    let node = series([
        TaskNode::from(ok_task("clean", &log)),
        parallel([
            slow_task("styles", Duration::from_millis(30), &log),
            slow_task("scripts", Duration::from_millis(10), &log),
            slow_task("assets", Duration::from_millis(20), &log),
        ]),
        TaskNode::from(ok_task("minify", &log)),
    ]);

    let runner = PipelineRunner::new();
    with_timeout(runner.run(&node, "build")).await?;

    let clean_done = log.index_of(&Step::Finished("clean".into())).unwrap();
    let minify_start = log.index_of(&Step::Started("minify".into())).unwrap();
    for name in ["styles", "scripts", "assets"] {
        let started = log.index_of(&Step::Started(name.into())).unwrap();
        let finished = log.index_of(&Step::Finished(name.into())).unwrap();
        assert!(clean_done < started, "{name} started before clean finished");
        assert!(finished < minify_start, "minify started before {name} finished");
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failure_inside_parallel_short_circuits_enclosing_series() -> TestResult {
    init_tracing();
    let log = ExecLog::new();
    let node = series([
        parallel([failing_task("lint", &log), ok_task("build-js", &log)]),
        TaskNode::from(ok_task("minify-html", &log)),
    ]);

    let runner = PipelineRunner::new();
    let err = runner.run(&node, "build").await.expect_err("lint failed");

    assert_eq!(err.failed_tasks(), vec!["lint"]);
    assert_eq!(log.start_count("build-js"), 1);
    assert_eq!(log.start_count("minify-html"), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn graphs_can_be_run_repeatedly() -> TestResult {
    let log = ExecLog::new();
    let node = series([ok_task("a", &log), ok_task("b", &log)]);
    let runner = PipelineRunner::new();

    runner.run(&node, "first").await?;
    runner.run(&node, "second").await?;

    assert_eq!(log.start_count("a"), 2);
    assert_eq!(log.start_count("b"), 2);
    Ok(())
}
