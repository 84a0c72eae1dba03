// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// The subset of `package.json` the runner cares about.
///
/// ```json
/// {
///   "name": "web",
///   "scripts": { "prebuild": "rm -rf dist", "build": "tsc", "test": "vitest" },
///   "workspaces": ["packages/*"]
/// }
/// ```
///
/// Every field is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,

    /// Script name -> shell command. Sorted, which is also the order glob
    /// expansion reports matches in.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    #[serde(default)]
    pub workspaces: Option<WorkspacesField>,
}

/// `workspaces` comes either as a plain list of globs or as an object with a
/// `packages` list (the yarn-style form).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkspacesField {
    Patterns(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

/// `pre<name>` / `post<name>` commands discovered for one script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptHooks {
    pub pre: Option<(String, String)>,
    pub post: Option<(String, String)>,
}

impl Manifest {
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    /// Look up the hook scripts for `name` by naming convention.
    ///
    /// Each hook is returned as `(script key, command)`.
    pub fn hooks_for(&self, name: &str) -> ScriptHooks {
        let lookup = |key: String| self.scripts.get(&key).map(|cmd| (key, cmd.clone()));
        ScriptHooks {
            pre: lookup(format!("pre{name}")),
            post: lookup(format!("post{name}")),
        }
    }

    /// True if `key` is the `pre`/`post` hook of another script in this
    /// manifest (e.g. `prebuild` when `build` exists).
    pub fn is_hook_key(&self, key: &str) -> bool {
        ["pre", "post"].iter().any(|prefix| {
            key.strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty() && self.scripts.contains_key(rest))
        })
    }

    pub fn workspace_patterns(&self) -> &[String] {
        match &self.workspaces {
            Some(WorkspacesField::Patterns(patterns)) => patterns,
            Some(WorkspacesField::Object { packages }) => packages,
            None => &[],
        }
    }

    pub fn declares_workspaces(&self) -> bool {
        self.workspaces.is_some()
    }
}
