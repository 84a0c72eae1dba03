// src/config/validate.rs

use std::path::Path;

use globset::Glob;

use crate::config::model::Manifest;
use crate::errors::{MultirunError, Result};

/// Run basic semantic validation against a loaded manifest.
///
/// This checks:
/// - no script has an empty name
/// - every `workspaces` entry is a valid glob (a leading `!` is allowed)
///
/// Script bodies are not inspected; an empty body is a valid no-op script.
pub fn validate_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    validate_script_names(manifest, path)?;
    validate_workspace_patterns(manifest)?;
    Ok(())
}

fn validate_script_names(manifest: &Manifest, path: &Path) -> Result<()> {
    if manifest.scripts.keys().any(|name| name.trim().is_empty()) {
        return Err(MultirunError::Manifest {
            path: path.to_path_buf(),
            message: "script names must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_workspace_patterns(manifest: &Manifest) -> Result<()> {
    for pattern in manifest.workspace_patterns() {
        let body = pattern.strip_prefix('!').unwrap_or(pattern);
        Glob::new(body).map_err(|source| MultirunError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
    }
    Ok(())
}
