// src/resolve/plan.rs

//! Plan builder: CLI input -> ordered Groups.
//!
//! Ordering rules:
//! - root runs: argument order, glob matches alphabetical within a token;
//! - workspace runs: package order outermost, names innermost.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::config::{find_manifest, find_workspace_root, Manifest};
use crate::engine::{Group, StageCommand};
use crate::errors::{MultirunError, Result};
use crate::fs::FileSystem;
use crate::resolve::scripts::{resolve_in_package, resolve_scripts, ResolvedScript, ScriptStage};
use crate::resolve::workspaces::{select_packages, WorkspacePackage};

#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_SEPARATOR: &str = ":";

/// Which packages a run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The nearest package (or bare directory) only.
    Root,
    /// `--filter` patterns; packages lacking a script are skipped.
    Filter(Vec<String>),
    /// `--workspaces`: every workspace package, root excluded.
    Workspaces,
}

/// Everything the plan builder needs, independent of process state.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub names: Vec<String>,
    pub cwd: PathBuf,
    pub selection: Selection,
    pub if_present: bool,
    /// `--env` overrides, applied last.
    pub env: Vec<(String, String)>,
    /// `PATH` inherited from the parent, extended with `node_modules/.bin`.
    pub inherited_path: Option<String>,
}

impl RunRequest {
    pub fn new(names: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            names,
            cwd: cwd.into(),
            selection: Selection::Root,
            if_present: false,
            env: Vec::new(),
            inherited_path: None,
        }
    }

    /// Build a request from `run` arguments and the parent's environment.
    pub fn from_args(args: &RunArgs, cwd: PathBuf) -> Self {
        let selection = if !args.filter.is_empty() {
            Selection::Filter(args.filter.clone())
        } else if args.workspaces {
            Selection::Workspaces
        } else {
            Selection::Root
        };

        Self {
            names: args.names.clone(),
            cwd,
            selection,
            if_present: args.if_present,
            env: args.env.clone(),
            inherited_path: std::env::var("PATH").ok(),
        }
    }
}

/// Resolve the request into Groups, failing before anything is spawned if
/// a name cannot be resolved.
pub fn build_groups(request: &RunRequest, fs: &dyn FileSystem) -> Result<Vec<Group>> {
    let groups = match &request.selection {
        Selection::Root => root_groups(request, fs)?,
        Selection::Filter(filters) => workspace_groups(request, fs, Some(filters.as_slice()))?,
        Selection::Workspaces => workspace_groups(request, fs, None)?,
    };

    info!(
        groups = groups.len(),
        labels = ?groups.iter().map(|g| g.label.as_str()).collect::<Vec<_>>(),
        "planned run"
    );
    Ok(groups)
}

fn root_groups(request: &RunRequest, fs: &dyn FileSystem) -> Result<Vec<Group>> {
    let loaded = find_manifest(fs, &request.cwd)?;
    let (dir, manifest) = match &loaded {
        Some(l) => (l.dir.as_path(), Some(&l.manifest)),
        None => (request.cwd.as_path(), None),
    };

    let resolved = resolve_scripts(&request.names, manifest, dir, fs)?;

    Ok(resolved
        .into_iter()
        .enumerate()
        .map(|(index, script)| {
            let label = script.label.clone();
            group_from(index, label, dir, manifest, script, request)
        })
        .collect())
}

fn workspace_groups(
    request: &RunRequest,
    fs: &dyn FileSystem,
    filters: Option<&[String]>,
) -> Result<Vec<Group>> {
    let Some(root) = find_workspace_root(fs, &request.cwd)? else {
        return Err(MultirunError::NoPackagesMatched);
    };

    let packages = select_packages(fs, &root, filters)?;
    // Only a bare `--workspaces` insists that every package has the script.
    let strict = filters.is_none() && !request.if_present;

    let mut groups = Vec::new();
    for package in &packages {
        for name in &request.names {
            let Some(scripts) = resolve_in_package(&package.manifest, name)? else {
                if strict {
                    return Err(MultirunError::MissingScript {
                        script: name.clone(),
                        package: package.label.clone(),
                    });
                }
                debug!(package = %package.label, script = %name, "package lacks script; skipping");
                continue;
            };

            for script in scripts {
                let label = package_label(package, &script);
                groups.push(group_from(
                    groups.len(),
                    label,
                    &package.dir,
                    Some(&package.manifest),
                    script,
                    request,
                ));
            }
        }
    }

    if groups.is_empty() {
        return Err(MultirunError::NoPackagesMatched);
    }
    Ok(groups)
}

fn package_label(package: &WorkspacePackage, script: &ResolvedScript) -> String {
    format!("{}:{}", package.label, script.label)
}

fn group_from(
    index: usize,
    label: String,
    dir: &Path,
    manifest: Option<&Manifest>,
    script: ResolvedScript,
    request: &RunRequest,
) -> Group {
    let base = base_env(dir, manifest, request);
    let stage = |stage: ScriptStage| stage_command(stage, &base, &request.env);

    Group::new(
        index,
        label,
        dir,
        script.pre.map(stage),
        stage(script.main),
        script.post.map(stage),
    )
}

/// Variables every stage of a package gets.
fn base_env(dir: &Path, manifest: Option<&Manifest>, request: &RunRequest) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    if let Some(name) = manifest.and_then(|m| m.name.as_deref()) {
        env.insert("npm_package_name".to_string(), name.to_string());
    }

    let bin = dir.join("node_modules").join(".bin");
    let path = match request.inherited_path.as_deref() {
        Some(inherited) if !inherited.is_empty() => {
            format!("{}{PATH_SEPARATOR}{inherited}", bin.display())
        }
        _ => bin.display().to_string(),
    };
    env.insert("PATH".to_string(), path);

    env
}

fn stage_command(
    stage: ScriptStage,
    base: &BTreeMap<String, String>,
    overrides: &[(String, String)],
) -> StageCommand {
    let mut cmd = StageCommand::new(stage.command);
    cmd.env = base.clone();

    if let Some(script) = stage.script {
        cmd.env.insert("npm_lifecycle_event".to_string(), script);
    }

    for (key, value) in overrides {
        cmd.env.insert(key.clone(), value.clone());
    }
    cmd
}
