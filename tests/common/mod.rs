#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

pub use multirun_test_utils::builders::ManifestBuilder;
pub use multirun_test_utils::capture::{capture_sink, SharedBuffer};
pub use multirun_test_utils::fake_executor::{FakeBehaviour, FakeExecutor, FAKE_TERM_SIGNAL};
pub use multirun_test_utils::{init_tracing, with_timeout};

use multirun::engine::{Group, Orchestrator, OrchestratorOptions, RunReport};
use multirun::exec::ShellExecutor;
use multirun::types::RunMode;

/// Captured result of one orchestrated run.
pub struct Captured {
    pub report: RunReport,
    pub stdout: SharedBuffer,
    pub stderr: SharedBuffer,
}

impl Captured {
    pub fn out(&self) -> String {
        self.stdout.text()
    }

    pub fn err(&self) -> String {
        self.stderr.text()
    }
}

pub fn options(mode: RunMode, exit_on_error: bool) -> OrchestratorOptions {
    OrchestratorOptions {
        mode,
        exit_on_error,
        colored: false,
        kill_grace: Duration::from_millis(500),
    }
}

pub async fn run_groups(
    groups: Vec<Group>,
    options: OrchestratorOptions,
    executor: Arc<dyn ShellExecutor>,
) -> Captured {
    let (sink, stdout, stderr) = capture_sink();
    let orchestrator = Orchestrator::new(groups, options, executor, sink);
    let report = with_timeout(orchestrator.run()).await;
    Captured {
        report,
        stdout,
        stderr,
    }
}
