#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

/// Builder for `package.json` contents to simplify test setup.
pub struct ManifestBuilder {
    name: Option<String>,
    scripts: Map<String, Value>,
    workspaces: Option<Vec<String>>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            scripts: Map::new(),
            workspaces: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn script(mut self, key: &str, command: &str) -> Self {
        self.scripts
            .insert(key.to_string(), Value::String(command.to_string()));
        self
    }

    pub fn workspaces(mut self, patterns: &[&str]) -> Self {
        self.workspaces = Some(patterns.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn build(self) -> String {
        let mut root = Map::new();
        if let Some(name) = self.name {
            root.insert("name".to_string(), Value::String(name));
        }
        root.insert("scripts".to_string(), Value::Object(self.scripts));
        if let Some(patterns) = self.workspaces {
            root.insert(
                "workspaces".to_string(),
                Value::Array(patterns.into_iter().map(Value::String).collect()),
            );
        }
        serde_json::to_string_pretty(&Value::Object(root)).expect("serialize manifest")
    }

    /// Write `package.json` into `dir`, creating the directory if needed.
    pub fn write_to(self, dir: &Path) {
        fs::create_dir_all(dir).expect("create package dir");
        fs::write(dir.join("package.json"), self.build()).expect("write package.json");
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
