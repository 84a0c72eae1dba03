// src/engine/orchestrator.rs

//! Async driver for a whole run.
//!
//! The [`Orchestrator`] owns the Groups, one cancellation token shared by
//! every Handle and the output sink. It starts Groups according to the
//! [`RunMode`], waits for all of them and folds their outcomes into a single
//! exit code via [`FailureSlots`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::failures::FailureSlots;
use crate::engine::group::{run_group, Group, GroupReport, HandleReport};
use crate::engine::handle::RunContext;
use crate::engine::{HandleOutcome, HandleState, INTERRUPTED_EXIT_CODE};
use crate::exec::ShellExecutor;
use crate::output::{LabelFormatter, OutputSink};
use crate::types::RunMode;

/// Grace period between SIGTERM and SIGKILL for cancelled Handles.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(3);

/// Options that control how the orchestrator behaves.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub mode: RunMode,
    /// Stop everything on the first failing Handle.
    pub exit_on_error: bool,
    /// Colour label prefixes.
    pub colored: bool,
    pub kill_grace: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Sequential,
            exit_on_error: true,
            colored: false,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One report per Group, in creation order.
    pub groups: Vec<GroupReport>,
    pub exit_code: i32,
    /// True if the run was stopped by [`InterruptHandle::interrupt`].
    pub interrupted: bool,
}

impl RunReport {
    pub fn group(&self, label: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.label == label)
    }

    pub fn failed_groups(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.iter().filter(|g| g.failure_code().is_some())
    }
}

/// Cloneable handle used to stop a run from outside (Ctrl-C).
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    cancel: CancellationToken,
    interrupted: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Terminate every running Handle and skip everything not yet started.
    /// The run then exits with code 130.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }
}

pub struct Orchestrator {
    groups: Vec<Group>,
    prefixes: Vec<Arc<[u8]>>,
    options: OrchestratorOptions,
    ctx: RunContext,
    interrupted: Arc<AtomicBool>,
    label_width: usize,
}

impl Orchestrator {
    pub fn new(
        groups: Vec<Group>,
        options: OrchestratorOptions,
        executor: Arc<dyn ShellExecutor>,
        sink: OutputSink,
    ) -> Self {
        let formatter = LabelFormatter::new(groups.iter().map(|g| g.label.as_str()), options.colored);
        let prefixes = groups
            .iter()
            .map(|g| Arc::from(formatter.prefix(&g.label, g.index)))
            .collect();

        let ctx = RunContext {
            executor,
            sink,
            cancel: CancellationToken::new(),
            exit_on_error: options.exit_on_error,
            kill_grace: options.kill_grace,
        };

        Self {
            groups,
            prefixes,
            label_width: formatter.width(),
            options,
            ctx,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Width every label is padded to.
    pub fn label_width(&self) -> usize {
        self.label_width
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            cancel: self.ctx.cancel.clone(),
            interrupted: self.interrupted.clone(),
        }
    }

    /// Run every Group to completion and compute the exit code.
    pub async fn run(self) -> RunReport {
        info!(
            groups = self.groups.len(),
            mode = ?self.options.mode,
            exit_on_error = self.options.exit_on_error,
            "starting run"
        );

        let reports = match self.options.mode {
            RunMode::Parallel => self.run_parallel().await,
            RunMode::Sequential => self.run_sequential().await,
        };

        let interrupted = self.interrupted.load(Ordering::SeqCst);
        finalize(reports, interrupted)
    }

    async fn run_parallel(&self) -> Vec<GroupReport> {
        let tasks: Vec<JoinHandle<GroupReport>> = self
            .groups
            .iter()
            .zip(&self.prefixes)
            .map(|(group, prefix)| {
                let ctx = self.ctx.clone();
                let group = group.clone();
                let prefix = prefix.clone();
                tokio::spawn(async move { run_group(&ctx, &group, prefix).await })
            })
            .collect();

        // Await in creation order; completion order does not matter.
        let mut reports = Vec::with_capacity(tasks.len());
        for (task, group) in tasks.into_iter().zip(&self.groups) {
            match task.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(group = %group.label, error = %e, "group task failed");
                    reports.push(errored_report(group));
                }
            }
        }
        reports
    }

    async fn run_sequential(&self) -> Vec<GroupReport> {
        let mut reports = Vec::with_capacity(self.groups.len());
        for (group, prefix) in self.groups.iter().zip(&self.prefixes) {
            // Skipped Groups still get a report so the run summary stays
            // complete; run_group spawns nothing once the run is cancelled.
            let report = run_group(&self.ctx, group, prefix.clone()).await;
            reports.push(report);
        }
        reports
    }
}

/// Report for a Group whose driver task panicked.
fn errored_report(group: &Group) -> GroupReport {
    GroupReport {
        index: group.index,
        label: group.label.clone(),
        handles: group
            .handles
            .iter()
            .map(|h| HandleReport {
                stage: h.stage,
                command_line: h.command_line.clone(),
                state: HandleState::Done,
                outcome: Some(HandleOutcome::Errored),
            })
            .collect(),
        aborted: true,
        result: Some(HandleOutcome::Errored),
    }
}

fn finalize(groups: Vec<GroupReport>, interrupted: bool) -> RunReport {
    let mut failures = FailureSlots::new(groups.len());
    for (slot, report) in groups.iter().enumerate() {
        if let Some(code) = report.failure_code() {
            failures.record(slot, code);
        }
    }

    let exit_code = if interrupted {
        INTERRUPTED_EXIT_CODE
    } else {
        failures.first().unwrap_or(0)
    };

    debug!(
        failures = failures.failure_count(),
        exit_code, interrupted, "run finished"
    );

    RunReport {
        groups,
        exit_code,
        interrupted,
    }
}
