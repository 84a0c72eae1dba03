// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::Manifest;
use crate::config::validate::validate_manifest;
use crate::errors::{MultirunError, Result};
use crate::fs::FileSystem;

/// File name of the package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// A manifest together with the directory it was read from.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub dir: PathBuf,
    pub manifest: Manifest,
}

/// Load a manifest from a given path.
///
/// This only performs JSON deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(fs: &dyn FileSystem, path: &Path) -> Result<Manifest> {
    let contents = fs.read_to_string(path)?;

    serde_json::from_str(&contents).map_err(|e| MultirunError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a manifest from path and run basic validation.
pub fn load_and_validate(fs: &dyn FileSystem, path: &Path) -> Result<Manifest> {
    let manifest = load_from_path(fs, path)?;
    validate_manifest(&manifest, path)?;
    Ok(manifest)
}

/// Find the nearest manifest at or above `start`.
///
/// Returns `Ok(None)` when no ancestor has a `package.json`; scripts then run
/// as raw commands in `start`.
pub fn find_manifest(fs: &dyn FileSystem, start: &Path) -> Result<Option<LoadedManifest>> {
    for dir in start.ancestors() {
        let candidate = dir.join(MANIFEST_FILE);
        if fs.is_file(&candidate) {
            debug!(path = ?candidate, "using manifest");
            let manifest = load_and_validate(fs, &candidate)?;
            return Ok(Some(LoadedManifest {
                dir: dir.to_path_buf(),
                manifest,
            }));
        }
    }
    Ok(None)
}

/// Find the workspace root for `start`: the nearest ancestor manifest that
/// declares `workspaces`.
///
/// Falls back to the nearest manifest of any kind, so `--filter` still works
/// on a single-package project (where only the root package can match).
pub fn find_workspace_root(fs: &dyn FileSystem, start: &Path) -> Result<Option<LoadedManifest>> {
    let mut nearest: Option<LoadedManifest> = None;

    for dir in start.ancestors() {
        let candidate = dir.join(MANIFEST_FILE);
        if !fs.is_file(&candidate) {
            continue;
        }

        let manifest = load_and_validate(fs, &candidate)?;
        if manifest.declares_workspaces() {
            debug!(path = ?candidate, "using workspace root manifest");
            return Ok(Some(LoadedManifest {
                dir: dir.to_path_buf(),
                manifest,
            }));
        }

        if nearest.is_none() {
            nearest = Some(LoadedManifest {
                dir: dir.to_path_buf(),
                manifest,
            });
        }
    }

    Ok(nearest)
}
