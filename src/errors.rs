// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only failures that stop a run *before* any process is spawned (or that
//! prevent the run from being planned at all) are represented here. Children
//! exiting non-zero are ordinary data and flow through
//! [`crate::engine::HandleOutcome`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code used for usage / validation errors.
pub const USAGE_EXIT_CODE: i32 = 2;

#[derive(Error, Debug)]
pub enum MultirunError {
    #[error("{0}")]
    Usage(String),

    #[error("No scripts match pattern \"{0}\"")]
    NoScriptsMatch(String),

    #[error("Missing \"{script}\" script in package \"{package}\"")]
    MissingScript { script: String, package: String },

    #[error("No workspace packages matched")]
    NoPackagesMatched,

    #[error("Invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid manifest {path:?}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn \"{label}\": {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MultirunError {
    pub fn usage(message: impl Into<String>) -> Self {
        MultirunError::Usage(message.into())
    }

    /// True for errors caused by the invocation itself (flags, names,
    /// patterns) rather than by the environment.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            MultirunError::Usage(_)
                | MultirunError::NoScriptsMatch(_)
                | MultirunError::MissingScript { .. }
                | MultirunError::NoPackagesMatched
                | MultirunError::InvalidPattern { .. }
        )
    }

    /// Process exit code for a run that failed with this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_usage() { USAGE_EXIT_CODE } else { 1 }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MultirunError>;
