// src/output/line_buffer.rs

//! Byte-stream to line accumulator (one per Handle per stream).
//!
//! Only `\n` terminates a line. `\r`, NUL and any other bytes are kept as
//! content, so progress bars that redraw with `\r` end up as one long line
//! flushed when the stream closes.

/// Accumulates partial writes and hands back complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without the `\n`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let mut line = std::mem::take(&mut self.buf);
            line.extend_from_slice(&rest[..pos]);
            lines.push(line);
            rest = &rest[pos + 1..];
        }

        self.buf.extend_from_slice(rest);
        lines
    }

    /// Flush the unterminated tail at end of stream, if any.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }

    /// Bytes received since the last `\n`.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}
