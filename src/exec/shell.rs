// src/exec/shell.rs

//! Production shell executor built on `tokio::process`.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{MultirunError, Result};
use crate::exec::backend::{
    ExitOutcome, OutputStream, ProcessControl, ShellExecutor, SpawnRequest, SpawnedProcess,
};

/// Spawns every command through the platform shell (`sh -c` / `cmd /C`).
///
/// On Unix each child becomes the leader of its own process group so that
/// termination reaches whatever the shell started, not just the shell.
#[derive(Debug, Clone, Default)]
pub struct RealShellExecutor;

impl RealShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    }
}

impl ShellExecutor for RealShellExecutor {
    fn spawn(&self, request: &SpawnRequest) -> Result<SpawnedProcess> {
        info!(
            label = %request.label,
            cmd = %request.command_line,
            cwd = ?request.cwd,
            "starting process"
        );

        let mut cmd = shell_command(&request.command_line);
        cmd.current_dir(&request.cwd)
            .envs(&request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| MultirunError::Spawn {
            label: request.label.clone(),
            source,
        })?;

        let stdout = child.stdout.take().map(|s| Box::new(s) as OutputStream);
        let stderr = child.stderr.take().map(|s| Box::new(s) as OutputStream);
        let pid = child.id();

        debug!(label = %request.label, ?pid, "process spawned");

        Ok(SpawnedProcess {
            stdout,
            stderr,
            control: Box::new(ShellProcess {
                label: request.label.clone(),
                child,
                pid,
                exit: None,
            }),
        })
    }
}

struct ShellProcess {
    label: String,
    child: Child,
    pid: Option<u32>,
    exit: Option<ExitOutcome>,
}

impl ProcessControl for ShellProcess {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + '_>> {
        Box::pin(async move {
            if let Some(outcome) = self.exit {
                return Ok(outcome);
            }

            let status = self
                .child
                .wait()
                .await
                .with_context(|| format!("waiting for process of \"{}\"", self.label))?;

            let outcome = outcome_from_status(status);
            debug!(label = %self.label, ?outcome, "process exited");
            self.exit = Some(outcome);
            Ok(outcome)
        })
    }

    // The group outlives its leader while background jobs are alive, so the
    // group is signalled even after the shell itself has exited.
    fn terminate(&mut self) {
        #[cfg(unix)]
        self.signal_group(nix::sys::signal::Signal::SIGTERM);

        #[cfg(not(unix))]
        self.kill();
    }

    fn kill(&mut self) {
        #[cfg(unix)]
        self.signal_group(nix::sys::signal::Signal::SIGKILL);

        if self.exit.is_some() {
            return;
        }
        if let Err(e) = self.child.start_kill() {
            debug!(label = %self.label, error = %e, "start_kill failed");
        }
    }
}

impl ShellProcess {
    #[cfg(unix)]
    fn signal_group(&mut self, signal: nix::sys::signal::Signal) {
        use nix::sys::signal::killpg;
        use nix::unistd::Pid;

        let Some(pid) = self.pid else {
            return;
        };

        match killpg(Pid::from_raw(pid as i32), signal) {
            Ok(()) => info!(
                label = %self.label,
                pid,
                signal = signal.as_str(),
                "signalled process group"
            ),
            // Every member already exited.
            Err(nix::errno::Errno::ESRCH) => debug!(
                label = %self.label,
                pid,
                signal = signal.as_str(),
                "process group already gone"
            ),
            Err(e) => warn!(
                label = %self.label,
                pid,
                signal = signal.as_str(),
                error = %e,
                "failed to signal process group"
            ),
        }
    }
}

fn outcome_from_status(status: ExitStatus) -> ExitOutcome {
    if let Some(code) = status.code() {
        return ExitOutcome::Code(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitOutcome::Signal(signal);
        }
    }

    // Neither a code nor a signal: treat as a generic failure.
    ExitOutcome::Code(1)
}

/// Human-readable name for a signal number, e.g. `SIGKILL`.
pub fn signal_name(signal: i32) -> String {
    #[cfg(unix)]
    {
        if let Ok(sig) = nix::sys::signal::Signal::try_from(signal) {
            return sig.as_str().to_string();
        }
    }
    format!("signal {signal}")
}
