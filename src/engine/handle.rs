// src/engine/handle.rs

//! Running a single Handle: spawn, pump both pipes through line buffers,
//! wait (or terminate on cancellation) and report the status line.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{HandleOutcome, Stage};
use crate::errors::Result;
use crate::exec::{
    ExitOutcome, OutputStream, ProcessControl, ShellExecutor, SpawnRequest, SpawnedProcess,
};
use crate::output::{LineBuffer, OutputSink};
use crate::types::StreamKind;

const READ_CHUNK: usize = 8 * 1024;

/// One script invocation as planned: everything needed to spawn it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleSpec {
    pub label: String,
    pub command_line: String,
    pub cwd: PathBuf,
    /// Overrides applied on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    pub stage: Stage,
    pub color_index: usize,
}

impl HandleSpec {
    pub fn spawn_request(&self) -> SpawnRequest {
        SpawnRequest {
            label: self.label.clone(),
            command_line: self.command_line.clone(),
            cwd: self.cwd.clone(),
            env: self.env.clone(),
        }
    }
}

/// Shared state every Handle of a run needs.
#[derive(Clone)]
pub(crate) struct RunContext {
    pub executor: Arc<dyn ShellExecutor>,
    pub sink: OutputSink,
    pub cancel: CancellationToken,
    pub exit_on_error: bool,
    /// How long a terminated child gets before it is killed outright.
    pub kill_grace: Duration,
}

/// Run one Handle to completion.
///
/// Never spawns if the run was already cancelled. A Handle cancelled while
/// running, or while its output is still draining after a clean exit, still
/// has every complete line it produced written out, but gets no status line.
pub(crate) async fn run_handle(
    ctx: &RunContext,
    handle: &HandleSpec,
    prefix: &Arc<[u8]>,
) -> HandleOutcome {
    if ctx.cancel.is_cancelled() {
        debug!(label = %handle.label, stage = %handle.stage, "run cancelled; not spawning");
        return HandleOutcome::Skipped;
    }

    let started = Instant::now();

    let SpawnedProcess {
        stdout,
        stderr,
        mut control,
    } = match ctx.executor.spawn(&handle.spawn_request()) {
        Ok(spawned) => spawned,
        Err(err) => {
            error!(label = %handle.label, stage = %handle.stage, error = %err, "failed to start process");
            let outcome = HandleOutcome::Errored;
            cancel_on_failure(ctx, handle, &outcome);
            report_status(ctx, prefix, &outcome, started.elapsed());
            return outcome;
        }
    };

    let pumps: Vec<JoinHandle<()>> = [(stdout, StreamKind::Stdout), (stderr, StreamKind::Stderr)]
        .into_iter()
        .filter_map(|(reader, kind)| {
            reader.map(|reader| tokio::spawn(pump_stream(reader, kind, prefix.clone(), ctx.sink.clone())))
        })
        .collect();

    let (exit, cancelled) = wait_or_cancel(ctx, control.as_mut(), &handle.label).await;

    let mut outcome = if cancelled {
        HandleOutcome::Cancelled
    } else {
        match exit {
            Ok(ExitOutcome::Code(code)) => HandleOutcome::Exited(code),
            Ok(ExitOutcome::Signal(signal)) => HandleOutcome::Signaled(signal),
            Err(err) => {
                error!(label = %handle.label, error = %err, "failed waiting for process");
                HandleOutcome::Errored
            }
        }
    };

    // Background jobs may keep the pipes open after the shell exits, so the
    // failure has to be signalled before draining.
    cancel_on_failure(ctx, handle, &outcome);

    // The next stage must not start before this one's output is flushed.
    let cancelled_while_draining = drain_or_cancel(ctx, control.as_mut(), pumps, &handle.label).await;
    if cancelled_while_draining && outcome == HandleOutcome::Exited(0) {
        outcome = HandleOutcome::Cancelled;
    }

    match outcome {
        HandleOutcome::Exited(0) => {
            info!(label = %handle.label, stage = %handle.stage, "process finished successfully")
        }
        HandleOutcome::Cancelled => info!(label = %handle.label, stage = %handle.stage, "process cancelled"),
        other => info!(label = %handle.label, stage = %handle.stage, outcome = ?other, "process failed"),
    }

    report_status(ctx, prefix, &outcome, started.elapsed());
    outcome
}

/// With exit-on-error, a failing Handle cancels the whole run so siblings are
/// terminated and unstarted work is skipped.
fn cancel_on_failure(ctx: &RunContext, handle: &HandleSpec, outcome: &HandleOutcome) {
    if ctx.exit_on_error && outcome.failure_code().is_some() && !ctx.cancel.is_cancelled() {
        info!(label = %handle.label, stage = %handle.stage, "failure with exit-on-error; cancelling run");
        ctx.cancel.cancel();
    }
}

/// Wait for exit, or terminate the child when the run is cancelled first.
///
/// Returns the exit result and whether cancellation was applied.
async fn wait_or_cancel(
    ctx: &RunContext,
    control: &mut dyn ProcessControl,
    label: &str,
) -> (Result<ExitOutcome>, bool) {
    tokio::select! {
        biased;

        res = control.wait() => (res, false),

        _ = ctx.cancel.cancelled() => {
            info!(label, "cancellation requested; terminating process");
            control.terminate();

            match tokio::time::timeout(ctx.kill_grace, control.wait()).await {
                Ok(res) => (res, true),
                Err(_) => {
                    warn!(label, grace = ?ctx.kill_grace, "process ignored termination; killing");
                    control.kill();
                    (control.wait().await, true)
                }
            }
        }
    }
}

/// Wait for the output pumps to hit EOF.
///
/// The shell may be gone while something it started in the background still
/// holds the pipes. If the run is cancelled meanwhile, the process group is
/// terminated (and killed after the grace period) so the pipes close.
/// Returns whether that happened.
async fn drain_or_cancel(
    ctx: &RunContext,
    control: &mut dyn ProcessControl,
    pumps: Vec<JoinHandle<()>>,
    label: &str,
) -> bool {
    let aborts: Vec<AbortHandle> = pumps.iter().map(JoinHandle::abort_handle).collect();
    let mut drain = std::pin::pin!(join_pumps(pumps, label));

    tokio::select! {
        biased;

        _ = &mut drain => return false,

        _ = ctx.cancel.cancelled() => {}
    }

    info!(label, "cancellation requested while output is draining; terminating process group");
    control.terminate();
    if tokio::time::timeout(ctx.kill_grace, &mut drain).await.is_ok() {
        return true;
    }

    warn!(label, grace = ?ctx.kill_grace, "process group ignored termination; killing");
    control.kill();
    if tokio::time::timeout(ctx.kill_grace, &mut drain).await.is_err() {
        // Something outside the group still holds the pipes.
        warn!(label, "output pipes still open after kill; abandoning them");
        for abort in aborts {
            abort.abort();
        }
    }
    true
}

async fn join_pumps(pumps: Vec<JoinHandle<()>>, label: &str) {
    for pump in pumps {
        if let Err(e) = pump.await {
            warn!(label, error = %e, "output pump task failed");
        }
    }
}

async fn pump_stream(mut reader: OutputStream, stream: StreamKind, prefix: Arc<[u8]>, sink: OutputSink) {
    let mut lines = LineBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                for line in lines.push(&chunk[..n]) {
                    sink.write_line(stream, &prefix, &line);
                }
            }
            Err(e) => {
                warn!(%stream, error = %e, "error reading child output");
                break;
            }
        }
    }

    if let Some(tail) = lines.finish() {
        sink.write_line(stream, &prefix, &tail);
    }
}

fn report_status(ctx: &RunContext, prefix: &[u8], outcome: &HandleOutcome, elapsed: Duration) {
    if let Some(message) = outcome.status_message(elapsed) {
        ctx.sink.write_status(prefix, &message);
    }
}
