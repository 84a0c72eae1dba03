// src/output/sink.rs

//! Serialized writer for the parent's stdout/stderr.
//!
//! Every call writes one complete `prefix + content + \n` record under a
//! lock, so lines from different Handles never tear into each other.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::types::StreamKind;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Clone)]
pub struct OutputSink {
    stdout: SharedWriter,
    stderr: SharedWriter,
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

impl OutputSink {
    pub fn new(
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
    ) -> Self {
        Self {
            stdout: Arc::new(Mutex::new(Box::new(stdout))),
            stderr: Arc::new(Mutex::new(Box::new(stderr))),
        }
    }

    /// Sink bound to the process's own stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    /// Write one prefixed line.
    ///
    /// Write failures (typically a closed pipe on our side) are logged and
    /// dropped; they must not abort the run.
    pub fn write_line(&self, stream: StreamKind, prefix: &[u8], content: &[u8]) {
        let mut record = Vec::with_capacity(prefix.len() + content.len() + 1);
        record.extend_from_slice(prefix);
        record.extend_from_slice(content);
        record.push(b'\n');

        let target = match stream {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        };

        let mut writer = target.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writer.write_all(&record).and_then(|_| writer.flush()) {
            debug!(%stream, error = %e, "dropping output line");
        }
    }

    /// Status lines (`Done in`, `Exited with code`, `Signaled`) always go to
    /// stderr.
    pub fn write_status(&self, prefix: &[u8], message: &str) {
        self.write_line(StreamKind::Stderr, prefix, message.as_bytes());
    }
}
