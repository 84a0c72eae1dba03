// src/engine/mod.rs

//! Orchestration engine for multirun.
//!
//! This module ties together:
//! - Handles: one shell invocation each, with output piped through a
//!   [`crate::output::LineBuffer`] per stream
//! - Groups: a `pre -> main -> post` chain sharing one label
//! - the Orchestrator: drives Groups in parallel or in sequence, cancels
//!   siblings on failure and folds outcomes into one exit code
//!
//! The Group chain state machine in [`group`] is pure and synchronous; the
//! async/IO side lives in [`handle`] and [`orchestrator`].

use std::fmt;
use std::time::Duration;

use crate::exec::signal_name;
use crate::output::format_duration;

/// Exit code reported for a Handle terminated by a signal.
pub const SIGNAL_EXIT_CODE: i32 = 1;

/// Exit code reported for a Handle whose process could not be started or
/// awaited.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 1;

/// Exit code of a run interrupted with Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Position of a Handle within its Group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Pre,
    Main,
    Post,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Pre => f.write_str("pre"),
            Stage::Main => f.write_str("main"),
            Stage::Post => f.write_str("post"),
        }
    }
}

/// Lifecycle of a single Handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Pending,
    Running,
    Done,
}

/// What happened to a Handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The process exited with this code.
    Exited(i32),
    /// The process was terminated by this signal, not by us.
    Signaled(i32),
    /// The process could not be spawned or awaited.
    Errored,
    /// The process was running and got terminated by the orchestrator.
    Cancelled,
    /// The run was cancelled before this Handle was spawned.
    Skipped,
}

impl HandleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, HandleOutcome::Exited(0))
    }

    /// Code this outcome contributes to exit-code aggregation, if it counts
    /// as a failure. Cancelled and skipped Handles never do.
    pub fn failure_code(&self) -> Option<i32> {
        match self {
            HandleOutcome::Exited(0) => None,
            HandleOutcome::Exited(code) => Some(*code),
            HandleOutcome::Signaled(_) => Some(SIGNAL_EXIT_CODE),
            HandleOutcome::Errored => Some(SPAWN_FAILURE_EXIT_CODE),
            HandleOutcome::Cancelled | HandleOutcome::Skipped => None,
        }
    }

    /// Status line written to stderr once the Handle is done, if any.
    pub fn status_message(&self, elapsed: Duration) -> Option<String> {
        match self {
            HandleOutcome::Exited(0) => Some(format!("Done in {}", format_duration(elapsed))),
            HandleOutcome::Exited(code) => Some(format!("Exited with code {code}")),
            HandleOutcome::Signaled(signal) => Some(format!("Signaled ({})", signal_name(*signal))),
            HandleOutcome::Errored => Some(format!("Exited with code {SPAWN_FAILURE_EXIT_CODE}")),
            HandleOutcome::Cancelled | HandleOutcome::Skipped => None,
        }
    }
}

pub mod failures;
pub mod group;
pub mod handle;
pub mod orchestrator;

pub use failures::FailureSlots;
pub use group::{Group, GroupChain, GroupReport, GroupState, HandleReport, StageCommand};
pub use handle::HandleSpec;
pub use orchestrator::{InterruptHandle, Orchestrator, OrchestratorOptions, RunReport};
