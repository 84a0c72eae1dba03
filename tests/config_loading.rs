// tests/config_loading.rs

mod common;
use crate::common::ManifestBuilder;

use std::path::Path;

use multirun::config::{find_manifest, load_and_validate, load_from_path};
use multirun::errors::MultirunError;
use multirun::fs::mock::MockFileSystem;

#[test]
fn workspaces_accepts_both_forms() {
    let fs = MockFileSystem::new();
    fs.add_file("/a/package.json", r#"{ "workspaces": ["apps/*"] }"#);
    fs.add_file("/b/package.json", r#"{ "workspaces": { "packages": ["libs/*"] } }"#);

    let a = load_from_path(&fs, Path::new("/a/package.json")).unwrap();
    let b = load_from_path(&fs, Path::new("/b/package.json")).unwrap();

    assert_eq!(a.workspace_patterns(), ["apps/*".to_string()]);
    assert_eq!(b.workspace_patterns(), ["libs/*".to_string()]);
    assert!(a.declares_workspaces());
}

#[test]
fn unknown_fields_are_ignored() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/p/package.json",
        r#"{ "name": "p", "version": "1.0.0", "dependencies": {}, "scripts": { "t": "x" } }"#,
    );

    let m = load_and_validate(&fs, Path::new("/p/package.json")).unwrap();
    assert_eq!(m.name.as_deref(), Some("p"));
    assert_eq!(m.script("t"), Some("x"));
    assert!(!m.declares_workspaces());
}

#[test]
fn hook_keys_are_recognised() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/p/package.json",
        ManifestBuilder::new()
            .script("build", "b")
            .script("prebuild", "pb")
            .script("prepare", "p")
            .build(),
    );
    let m = load_from_path(&fs, Path::new("/p/package.json")).unwrap();

    assert!(m.is_hook_key("prebuild"));
    // No `pare` script, so `prepare` is an ordinary script.
    assert!(!m.is_hook_key("prepare"));
    assert!(!m.is_hook_key("build"));

    let hooks = m.hooks_for("build");
    assert_eq!(hooks.pre, Some(("prebuild".to_string(), "pb".to_string())));
    assert_eq!(hooks.post, None);
}

#[test]
fn invalid_workspace_glob_is_rejected() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/package.json", r#"{ "workspaces": ["packages/[oops"] }"#);

    let err = load_and_validate(&fs, Path::new("/p/package.json")).unwrap_err();
    assert!(matches!(err, MultirunError::InvalidPattern { .. }));
}

#[test]
fn empty_script_name_is_rejected() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/package.json", r#"{ "scripts": { "": "echo" } }"#);

    let err = load_and_validate(&fs, Path::new("/p/package.json")).unwrap_err();
    assert!(matches!(err, MultirunError::Manifest { .. }));
}

#[test]
fn nearest_manifest_wins() {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/package.json", r#"{ "name": "outer" }"#);
    fs.add_file("/repo/pkg/package.json", r#"{ "name": "inner" }"#);
    fs.add_file("/repo/pkg/src/index.js", "");

    let found = find_manifest(&fs, Path::new("/repo/pkg/src")).unwrap().unwrap();
    assert_eq!(found.dir, Path::new("/repo/pkg"));
    assert_eq!(found.manifest.name.as_deref(), Some("inner"));

    assert!(find_manifest(&fs, Path::new("/elsewhere")).unwrap().is_none());
}
