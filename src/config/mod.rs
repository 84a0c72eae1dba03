// src/config/mod.rs

//! Manifest (`package.json`) loading and validation.
//!
//! Responsibilities:
//! - Define the JSON-backed data model (`model.rs`).
//! - Locate and load manifests from disk (`loader.rs`).
//! - Validate basic invariants like script names and workspace patterns
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    find_manifest, find_workspace_root, load_and_validate, load_from_path, LoadedManifest,
    MANIFEST_FILE,
};
pub use model::{Manifest, ScriptHooks, WorkspacesField};
pub use validate::validate_manifest;
