// src/resolve/scripts.rs

//! Script Resolver.
//!
//! Each CLI name resolves, in order of precedence, to:
//! 1. a manifest script (with its `pre<name>`/`post<name>` hooks),
//! 2. every script key matching a `*` glob, alphabetically,
//! 3. a script file run through its interpreter,
//! 4. a literal shell command.
//!
//! Hooks are looked up once here; the resulting [`ResolvedScript`] is the
//! fixed shape of the Group built from it.

use std::path::Path;

use globset::{Glob, GlobMatcher};
use tracing::debug;

use crate::config::Manifest;
use crate::errors::{MultirunError, Result};
use crate::fs::FileSystem;

/// One stage command, remembering the manifest key it came from (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStage {
    pub script: Option<String>,
    pub command: String,
}

impl ScriptStage {
    fn keyed(key: &str, command: &str) -> Self {
        Self {
            script: Some(key.to_string()),
            command: command.to_string(),
        }
    }

    fn literal(command: String) -> Self {
        Self {
            script: None,
            command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScript {
    pub label: String,
    pub pre: Option<ScriptStage>,
    pub main: ScriptStage,
    pub post: Option<ScriptStage>,
}

impl ResolvedScript {
    /// Manifest script `key` together with its hooks.
    pub fn from_manifest(manifest: &Manifest, key: &str, command: &str) -> Self {
        let hooks = manifest.hooks_for(key);
        let stage = |(key, cmd): (String, String)| ScriptStage::keyed(&key, &cmd);
        Self {
            label: key.to_string(),
            pre: hooks.pre.map(stage),
            main: ScriptStage::keyed(key, command),
            post: hooks.post.map(stage),
        }
    }

    fn literal(label: &str, command: String) -> Self {
        Self {
            label: label.to_string(),
            pre: None,
            main: ScriptStage::literal(command),
            post: None,
        }
    }
}

/// Resolve every name in argument order.
///
/// `dir` is the manifest directory (or the working directory when there is
/// no manifest); file scripts are looked up relative to it.
pub fn resolve_scripts(
    names: &[String],
    manifest: Option<&Manifest>,
    dir: &Path,
    fs: &dyn FileSystem,
) -> Result<Vec<ResolvedScript>> {
    let mut resolved = Vec::new();

    for name in names {
        if let Some((m, command)) = manifest.and_then(|m| m.script(name).map(|cmd| (m, cmd))) {
            debug!(name, "resolved manifest script");
            resolved.push(ResolvedScript::from_manifest(m, name, command));
            continue;
        }

        if is_glob(name) {
            let matches = match manifest {
                Some(m) => expand_glob(m, name)?,
                None => Vec::new(),
            };
            if matches.is_empty() {
                return Err(MultirunError::NoScriptsMatch(name.clone()));
            }
            debug!(pattern = %name, count = matches.len(), "expanded script glob");
            resolved.extend(matches);
            continue;
        }

        if let Some(command) = file_script_command(name, dir, fs) {
            debug!(name, %command, "resolved script file");
            resolved.push(ResolvedScript::literal(name, command));
            continue;
        }

        debug!(name, "running as literal command");
        resolved.push(ResolvedScript::literal(name, name.clone()));
    }

    Ok(resolved)
}

/// Resolve `name` inside one workspace package.
///
/// Only manifest scripts and globs apply here. `Ok(None)` means the package
/// has nothing for this name.
pub fn resolve_in_package(manifest: &Manifest, name: &str) -> Result<Option<Vec<ResolvedScript>>> {
    if let Some(command) = manifest.script(name) {
        return Ok(Some(vec![ResolvedScript::from_manifest(manifest, name, command)]));
    }

    if is_glob(name) {
        let matches = expand_glob(manifest, name)?;
        if !matches.is_empty() {
            return Ok(Some(matches));
        }
    }

    Ok(None)
}

fn is_glob(name: &str) -> bool {
    name.contains('*')
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| MultirunError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Matching script keys in alphabetical order. Keys that are only hooks of
/// another script are left out; they run with their main script.
fn expand_glob(manifest: &Manifest, pattern: &str) -> Result<Vec<ResolvedScript>> {
    let matcher = compile_glob(pattern)?;

    Ok(manifest
        .scripts
        .iter()
        .filter(|(key, _)| matcher.is_match(key.as_str()))
        .filter(|(key, _)| !manifest.is_hook_key(key))
        .map(|(key, command)| ResolvedScript::from_manifest(manifest, key, command))
        .collect())
}

/// Interpreter for a script file, by extension.
pub fn interpreter_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    match ext {
        "sh" => Some("sh"),
        "bash" => Some("bash"),
        "js" | "mjs" | "cjs" => Some("node"),
        "py" => Some("python3"),
        "rb" => Some("ruby"),
        _ => None,
    }
}

fn file_script_command(name: &str, dir: &Path, fs: &dyn FileSystem) -> Option<String> {
    let path = Path::new(name);
    let interpreter = interpreter_for(path)?;
    if !fs.is_file(&dir.join(path)) {
        return None;
    }
    Some(format!("{interpreter} {}", shell_quote(name)))
}

fn shell_quote(arg: &str) -> String {
    if arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+=".contains(c))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}
