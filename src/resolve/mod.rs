// src/resolve/mod.rs

//! Turning CLI names into Groups.
//!
//! - [`scripts`]: names, globs, files and raw commands against one manifest.
//! - [`workspaces`]: workspace package discovery and `--filter` selection.
//! - [`plan`]: glues both together and builds the engine's Groups, including
//!   the environment every stage runs with.

pub mod plan;
pub mod scripts;
pub mod workspaces;

pub use plan::{build_groups, RunRequest, Selection};
pub use scripts::{interpreter_for, resolve_in_package, resolve_scripts, ResolvedScript, ScriptStage};
pub use workspaces::{discover_packages, select_packages, WorkspacePackage};
