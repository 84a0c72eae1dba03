// src/resolve/workspaces.rs

//! Workspace Resolver.
//!
//! Packages come from the root manifest's `workspaces` globs, matched
//! against directories below the workspace root that contain a
//! `package.json`. Results are ordered by relative path so runs are
//! deterministic.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};

use crate::config::{load_and_validate, LoadedManifest, Manifest, MANIFEST_FILE};
use crate::errors::{MultirunError, Result};
use crate::fs::FileSystem;

/// Directory names never descended into while looking for packages.
const SKIPPED_DIRS: &[&str] = &["node_modules"];

#[derive(Debug, Clone)]
pub struct WorkspacePackage {
    pub dir: PathBuf,
    /// Path relative to the workspace root, `/`-separated; `.` for the root.
    pub rel_path: String,
    /// Manifest `name`, or `rel_path` when the package has none.
    pub label: String,
    pub manifest: Manifest,
    pub is_root: bool,
}

impl WorkspacePackage {
    fn new(dir: PathBuf, rel_path: String, manifest: Manifest, is_root: bool) -> Self {
        let label = manifest.name.clone().unwrap_or_else(|| rel_path.clone());
        Self {
            dir,
            rel_path,
            label,
            manifest,
            is_root,
        }
    }
}

/// Positive and negated (`!`) patterns compiled separately.
struct PatternSet {
    include: GlobSet,
    exclude: GlobSet,
    has_include: bool,
}

impl PatternSet {
    /// `paths` makes `*` stop at `/`; package names like `@scope/pkg` are
    /// matched without that restriction.
    fn compile<'a>(
        patterns: impl IntoIterator<Item = &'a str>,
        normalize: fn(&str) -> String,
        paths: bool,
    ) -> Result<Self> {
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut has_include = false;

        for raw in patterns {
            let (negated, body) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };

            let glob = GlobBuilder::new(&normalize(body))
                .literal_separator(paths)
                .build()
                .map_err(|source| MultirunError::InvalidPattern {
                    pattern: raw.to_string(),
                    source,
                })?;

            if negated {
                exclude.add(glob);
            } else {
                include.add(glob);
                has_include = true;
            }
        }

        let build = |builder: GlobSetBuilder| {
            builder.build().map_err(|source| MultirunError::InvalidPattern {
                pattern: String::new(),
                source,
            })
        };

        Ok(Self {
            include: build(include)?,
            exclude: build(exclude)?,
            has_include,
        })
    }

    fn matches(&self, candidate: &str) -> bool {
        (!self.has_include || self.includes(candidate)) && !self.excludes(candidate)
    }

    fn includes(&self, candidate: &str) -> bool {
        self.include.is_match(candidate)
    }

    fn excludes(&self, candidate: &str) -> bool {
        self.exclude.is_match(candidate)
    }
}

/// All packages declared by the root manifest, excluding the root itself.
pub fn discover_packages(fs: &dyn FileSystem, root: &LoadedManifest) -> Result<Vec<WorkspacePackage>> {
    let patterns = root.manifest.workspace_patterns();
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let set = PatternSet::compile(patterns.iter().map(String::as_str), normalize_path_pattern, true)?;

    let mut dirs = Vec::new();
    walk_dirs(fs, &root.dir, &mut dirs)?;

    let mut packages = Vec::new();
    for dir in dirs {
        let rel_path = relative_path(&root.dir, &dir);
        if !set.matches(&rel_path) {
            continue;
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        if !fs.is_file(&manifest_path) {
            trace!(dir = %rel_path, "matched directory has no manifest");
            continue;
        }

        let manifest = load_and_validate(fs, &manifest_path)?;
        debug!(package = %rel_path, name = ?manifest.name, "found workspace package");
        packages.push(WorkspacePackage::new(dir, rel_path, manifest, false));
    }

    packages.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(packages)
}

/// Packages a `--filter` / `--workspaces` run operates over.
///
/// `filters == None` selects every workspace package (not the root).
/// With filters the root package is a candidate too; a filter starting
/// with `.` or `/` matches the relative path, otherwise the package label.
/// A package is kept if it matches any positive filter (or there are none)
/// and no negated one.
pub fn select_packages(
    fs: &dyn FileSystem,
    root: &LoadedManifest,
    filters: Option<&[String]>,
) -> Result<Vec<WorkspacePackage>> {
    let members = discover_packages(fs, root)?;

    let Some(filters) = filters else {
        return Ok(members);
    };

    let (path_filters, name_filters): (Vec<&str>, Vec<&str>) = filters
        .iter()
        .map(String::as_str)
        .partition(|f| is_path_filter(f));

    let by_path = PatternSet::compile(path_filters.iter().copied(), normalize_path_pattern, true)?;
    let by_name = PatternSet::compile(name_filters.iter().copied(), |s: &str| s.to_string(), false)?;

    let root_package = WorkspacePackage::new(root.dir.clone(), ".".to_string(), root.manifest.clone(), true);

    let selected: Vec<WorkspacePackage> = std::iter::once(root_package)
        .chain(members)
        .filter(|pkg| {
            let included = !(by_path.has_include || by_name.has_include)
                || by_path.includes(&pkg.rel_path)
                || by_name.includes(&pkg.label);
            included && !by_path.excludes(&pkg.rel_path) && !by_name.excludes(&pkg.label)
        })
        .collect();

    debug!(
        filters = ?filters,
        selected = ?selected.iter().map(|p| p.label.as_str()).collect::<Vec<_>>(),
        "filtered workspace packages"
    );
    Ok(selected)
}

fn is_path_filter(filter: &str) -> bool {
    let body = filter.strip_prefix('!').unwrap_or(filter);
    body.starts_with('.') || body.starts_with('/')
}

/// `./packages/*/` -> `packages/*`; `./` and `/` -> `.`.
fn normalize_path_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim_start_matches("./").trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

fn relative_path(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => dir.to_string_lossy().replace('\\', "/"),
    }
}

/// Collect every directory below `dir` (not `dir` itself), skipping
/// `node_modules` and hidden directories.
fn walk_dirs(fs: &dyn FileSystem, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs.read_dir(dir)? {
        if !fs.is_dir(&entry) {
            continue;
        }

        let skip = entry
            .file_name()
            .and_then(|n| n.to_str())
            .is_none_or(|name| name.starts_with('.') || SKIPPED_DIRS.contains(&name));
        if skip {
            continue;
        }

        out.push(entry.clone());
        walk_dirs(fs, &entry, out)?;
    }
    Ok(())
}
