// src/fs/mod.rs

//! Filesystem access used by manifest loading and workspace discovery.
//!
//! Everything that inspects the project tree goes through [`FileSystem`] so
//! resolution can be exercised against [`mock::MockFileSystem`] without
//! touching disk.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{MultirunError, Result};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Return the entries of a directory as full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| MultirunError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let io_err = |source| MultirunError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(io_err)? {
            entries.push(entry.map_err(io_err)?.path());
        }
        entries.sort();
        Ok(entries)
    }
}
