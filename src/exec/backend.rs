// src/exec/backend.rs

//! Pluggable shell executor abstraction.
//!
//! The orchestrator never touches `tokio::process` directly; it asks a
//! [`ShellExecutor`] to spawn a command and gets back byte streams plus a
//! [`ProcessControl`] to await or terminate the child.
//!
//! - [`super::shell::RealShellExecutor`] is the production implementation.
//! - Tests can provide their own executor that scripts output and exit
//!   outcomes without spawning real processes.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::io::AsyncRead;

use crate::errors::Result;

/// Byte stream of one child output pipe.
pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Everything needed to start one Handle's process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Display label, used for logging and error messages only.
    pub label: String,
    pub command_line: String,
    pub cwd: PathBuf,
    /// Overrides applied on top of the inherited environment.
    pub env: BTreeMap<String, String>,
}

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Code(i32),
    /// Raw signal number.
    Signal(i32),
}

/// A spawned child with its output pipes taken out.
pub struct SpawnedProcess {
    pub stdout: Option<OutputStream>,
    pub stderr: Option<OutputStream>,
    pub control: Box<dyn ProcessControl>,
}

/// Lifecycle control over a spawned child.
pub trait ProcessControl: Send {
    /// Wait for the child to exit. Calling again after exit returns the same
    /// outcome.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + '_>>;

    /// Ask the child (and anything it started) to terminate.
    ///
    /// Still reaches processes the child left running after it exited.
    fn terminate(&mut self);

    /// Forcefully kill the child and anything it left running.
    fn kill(&mut self);
}

/// Trait abstracting how Handles are executed.
///
/// Production code uses [`super::shell::RealShellExecutor`]; tests can
/// provide their own implementation that doesn't spawn real processes.
pub trait ShellExecutor: Send + Sync {
    fn spawn(&self, request: &SpawnRequest) -> Result<SpawnedProcess>;
}
