// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running Handle commands through
//! the shell, using `tokio::process::Command`.
//!
//! - [`backend`] provides the `ShellExecutor` / `ProcessControl` traits the
//!   orchestrator talks to, so tests can swap in a fake executor.
//! - [`shell`] is the real implementation: `sh -c` in its own process group,
//!   with group-wide termination.

pub mod backend;
pub mod shell;

pub use backend::{
    ExitOutcome, OutputStream, ProcessControl, ShellExecutor, SpawnRequest, SpawnedProcess,
};
pub use shell::{shell_command, signal_name, RealShellExecutor};
