use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;

use multirun::errors::{MultirunError, Result};
use multirun::exec::{
    ExitOutcome, OutputStream, ProcessControl, ShellExecutor, SpawnRequest, SpawnedProcess,
};

/// Signal number reported for fake processes that were terminated.
pub const FAKE_TERM_SIGNAL: i32 = 15;

const PIPE_CAPACITY: usize = 64 * 1024;

/// What a fake process does once spawned: write its output chunks, then
/// exit with `outcome` after `delay` (or never, if it hangs).
#[derive(Debug, Clone)]
pub struct FakeBehaviour {
    pub stdout: Vec<Vec<u8>>,
    pub stderr: Vec<Vec<u8>>,
    pub outcome: ExitOutcome,
    pub delay: Duration,
    pub hang: bool,
    pub fail_spawn: bool,
}

impl Default for FakeBehaviour {
    fn default() -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            outcome: ExitOutcome::Code(0),
            delay: Duration::ZERO,
            hang: false,
            fail_spawn: false,
        }
    }
}

impl FakeBehaviour {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn exit(code: i32) -> Self {
        Self {
            outcome: ExitOutcome::Code(code),
            ..Self::default()
        }
    }

    pub fn signal(signal: i32) -> Self {
        Self {
            outcome: ExitOutcome::Signal(signal),
            ..Self::default()
        }
    }

    /// Runs until terminated.
    pub fn hang() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn fail_spawn() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    pub fn stdout(mut self, chunk: impl Into<Vec<u8>>) -> Self {
        self.stdout.push(chunk.into());
        self
    }

    pub fn stderr(mut self, chunk: impl Into<Vec<u8>>) -> Self {
        self.stderr.push(chunk.into());
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A fake executor that:
/// - looks up a [`FakeBehaviour`] by command line (unknown commands succeed)
/// - records which commands were spawned and which were terminated
/// - never starts a real process.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    behaviours: Arc<Mutex<HashMap<String, FakeBehaviour>>>,
    spawned: Arc<Mutex<Vec<String>>>,
    terminated: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, command_line: &str, behaviour: FakeBehaviour) -> Self {
        self.behaviours
            .lock()
            .unwrap()
            .insert(command_line.to_string(), behaviour);
        self
    }

    /// Command lines in spawn order.
    pub fn spawned(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn was_spawned(&self, command_line: &str) -> bool {
        self.spawned().iter().any(|c| c == command_line)
    }

    /// Command lines that received a terminate or kill request.
    pub fn terminated(&self) -> Vec<String> {
        self.terminated.lock().unwrap().clone()
    }
}

impl ShellExecutor for FakeExecutor {
    fn spawn(&self, request: &SpawnRequest) -> Result<SpawnedProcess> {
        let behaviour = self
            .behaviours
            .lock()
            .unwrap()
            .get(&request.command_line)
            .cloned()
            .unwrap_or_default();

        if behaviour.fail_spawn {
            return Err(MultirunError::Spawn {
                label: request.label.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "fake spawn failure"),
            });
        }

        self.spawned
            .lock()
            .unwrap()
            .push(request.command_line.clone());

        let (stdout_reader, mut stdout_writer) = tokio::io::duplex(PIPE_CAPACITY);
        let (stderr_reader, mut stderr_writer) = tokio::io::duplex(PIPE_CAPACITY);
        let (done_tx, done_rx) = oneshot::channel();
        let (term_tx, term_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            for chunk in &behaviour.stdout {
                let _ = stdout_writer.write_all(chunk).await;
            }
            for chunk in &behaviour.stderr {
                let _ = stderr_writer.write_all(chunk).await;
            }

            let outcome = if behaviour.hang {
                let _ = term_rx.await;
                ExitOutcome::Signal(FAKE_TERM_SIGNAL)
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(behaviour.delay) => behaviour.outcome,
                    Ok(()) = term_rx => ExitOutcome::Signal(FAKE_TERM_SIGNAL),
                }
            };

            // Close the pipes before reporting the exit, like a real child.
            drop(stdout_writer);
            drop(stderr_writer);
            let _ = done_tx.send(outcome);
        });

        Ok(SpawnedProcess {
            stdout: Some(Box::new(stdout_reader) as OutputStream),
            stderr: Some(Box::new(stderr_reader) as OutputStream),
            control: Box::new(FakeProcess {
                command_line: request.command_line.clone(),
                exit: None,
                done: done_rx,
                term: Some(term_tx),
                terminated: Arc::clone(&self.terminated),
            }),
        })
    }
}

struct FakeProcess {
    command_line: String,
    exit: Option<ExitOutcome>,
    done: oneshot::Receiver<ExitOutcome>,
    term: Option<oneshot::Sender<()>>,
    terminated: Arc<Mutex<Vec<String>>>,
}

impl FakeProcess {
    fn exited(&mut self) -> bool {
        if self.exit.is_none() {
            if let Ok(outcome) = self.done.try_recv() {
                self.exit = Some(outcome);
            }
        }
        self.exit.is_some()
    }

    fn request_termination(&mut self) {
        if self.exited() {
            return;
        }
        self.terminated
            .lock()
            .unwrap()
            .push(self.command_line.clone());
        if let Some(tx) = self.term.take() {
            let _ = tx.send(());
        }
    }
}

impl ProcessControl for FakeProcess {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + '_>> {
        Box::pin(async move {
            if let Some(outcome) = self.exit {
                return Ok(outcome);
            }
            let outcome = (&mut self.done)
                .await
                .map_err(|_| anyhow::anyhow!("fake process driver vanished"))?;
            self.exit = Some(outcome);
            Ok(outcome)
        })
    }

    fn terminate(&mut self) {
        self.request_termination();
    }

    fn kill(&mut self) {
        self.request_termination();
    }
}
