// tests/orchestrator_shell.rs
#![cfg(unix)]

mod common;
use crate::common::{capture_sink, init_tracing, options, run_groups, with_timeout};

use std::sync::Arc;
use std::time::{Duration, Instant};

use multirun::engine::{Group, HandleOutcome, Orchestrator, StageCommand};
use multirun::exec::RealShellExecutor;
use multirun::types::RunMode;

fn shell() -> Arc<RealShellExecutor> {
    Arc::new(RealShellExecutor::new())
}

#[tokio::test]
async fn real_processes_are_prefixed_per_stream() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![
        Group::single(0, "a", dir.path(), "echo out-a; echo err-a 1>&2"),
        Group::single(1, "b", dir.path(), "printf 'no-newline'"),
    ];
    let run = run_groups(groups, options(RunMode::Parallel, true), shell()).await;

    assert_eq!(run.report.exit_code, 0);
    assert!(run.out().contains("a | out-a\n"));
    assert!(run.out().contains("b | no-newline\n"));
    assert!(run.err().contains("a | err-a\n"));
    assert!(!run.out().contains("err-a"));
}

#[tokio::test]
async fn fast_failure_kills_a_sleeping_sibling() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![
        Group::single(0, "fail", dir.path(), "sleep 0.2; exit 3"),
        Group::single(1, "sleeper", dir.path(), "sleep 30"),
    ];

    let started = Instant::now();
    let run = run_groups(groups, options(RunMode::Parallel, true), shell()).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(run.report.exit_code, 3);
    assert!(run.err().contains("fail    | Exited with code 3"));
    assert_eq!(
        run.report.group("sleeper").unwrap().result,
        Some(HandleOutcome::Cancelled)
    );
}

#[tokio::test]
async fn background_job_holding_the_pipe_is_cancelled() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![
        Group::single(0, "bg", dir.path(), "sleep 8 & echo started"),
        Group::single(1, "fail", dir.path(), "sleep 0.3; exit 2"),
    ];

    let started = Instant::now();
    let run = run_groups(groups, options(RunMode::Parallel, true), shell()).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(run.report.exit_code, 2);
    assert!(run.out().contains("bg   | started\n"));
    assert!(run.err().contains("fail | Exited with code 2"));
    assert!(!run.err().contains("bg   |"));
    assert_eq!(
        run.report.group("bg").unwrap().result,
        Some(HandleOutcome::Cancelled)
    );
}

#[tokio::test]
async fn failing_script_does_not_wait_for_its_own_background_job() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![Group::single(0, "own", dir.path(), "sleep 8 & exit 3")];

    let started = Instant::now();
    let run = run_groups(groups, options(RunMode::Parallel, true), shell()).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(run.report.exit_code, 3);
    assert!(run.err().contains("own | Exited with code 3"));
}

#[tokio::test]
async fn interrupt_stops_a_background_job_after_the_shell_exits() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![Group::single(0, "bg", dir.path(), "sleep 8 & echo started")];
    let (sink, out, err) = capture_sink();
    let orchestrator = Orchestrator::new(groups, options(RunMode::Parallel, true), shell(), sink);

    let interrupt = orchestrator.interrupt_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        interrupt.interrupt();
    });

    let started = Instant::now();
    let report = with_timeout(orchestrator.run()).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(report.interrupted);
    assert_eq!(report.exit_code, 130);
    assert_eq!(report.group("bg").unwrap().result, Some(HandleOutcome::Cancelled));
    assert!(out.text().contains("bg | started\n"));
    assert!(err.text().is_empty());
}

#[tokio::test]
async fn process_killed_by_signal_is_reported() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![Group::single(0, "sig", dir.path(), "kill -9 $$")];
    let run = run_groups(groups, options(RunMode::Parallel, true), shell()).await;

    assert_eq!(run.report.exit_code, 1);
    assert_eq!(
        run.report.group("sig").unwrap().result,
        Some(HandleOutcome::Signaled(9))
    );
    assert!(run.err().contains("sig | Signaled (SIGKILL)"));
}

#[tokio::test]
async fn sequential_groups_see_earlier_side_effects() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![
        Group::single(0, "write", dir.path(), "echo hello > shared.txt"),
        Group::single(1, "read", dir.path(), "cat shared.txt"),
    ];
    let run = run_groups(groups, options(RunMode::Sequential, false), shell()).await;

    assert_eq!(run.report.exit_code, 0);
    assert!(run.out().contains("read  | hello\n"));
}

#[tokio::test]
async fn stage_environment_reaches_the_child() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![Group::new(
        0,
        "env",
        dir.path(),
        None,
        StageCommand::new("echo \"$GREETING\"").with_env("GREETING", "hi there"),
        None,
    )];
    let run = run_groups(groups, options(RunMode::Sequential, true), shell()).await;

    assert!(run.out().contains("env | hi there\n"));
}

#[tokio::test]
async fn missing_command_exits_with_shell_code() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let groups = vec![Group::single(0, "x", dir.path(), "definitely-not-a-command-xyz")];
    let run = run_groups(groups, options(RunMode::Sequential, true), shell()).await;

    assert_eq!(run.report.exit_code, 127);
    assert!(run.err().contains("x | Exited with code 127"));
}
