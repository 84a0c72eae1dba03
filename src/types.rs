// src/types.rs

//! Small shared enums.

use std::fmt;

/// How Groups are driven by the orchestrator.
///
/// - `Parallel`: every Group starts at once; stages inside a Group still run
///   in order.
/// - `Sequential`: one Group at a time, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    Parallel,
    #[default]
    Sequential,
}

/// Which output stream of a child a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}
