// tests/workspaces.rs

mod common;
use crate::common::{init_tracing, ManifestBuilder};

use std::path::Path;

use multirun::config::find_workspace_root;
use multirun::errors::MultirunError;
use multirun::fs::RealFileSystem;
use multirun::resolve::{build_groups, discover_packages, RunRequest, Selection};
use tempfile::TempDir;

/// root (name "root", workspaces packages/* minus packages/ignored)
/// ├── packages/a        "@acme/a": build
/// ├── packages/b        unnamed:  build, test
/// ├── packages/ignored  "ignored": build
/// ├── packages/notes    no manifest
/// └── node_modules/dep  "dep": build
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    ManifestBuilder::new()
        .name("root")
        .script("build", "echo root")
        .workspaces(&["packages/*", "!packages/ignored"])
        .write_to(root);
    ManifestBuilder::new()
        .name("@acme/a")
        .script("build", "echo a")
        .write_to(&root.join("packages/a"));
    ManifestBuilder::new()
        .script("build", "echo b")
        .script("test", "echo test-b")
        .write_to(&root.join("packages/b"));
    ManifestBuilder::new()
        .name("ignored")
        .script("build", "echo ignored")
        .write_to(&root.join("packages/ignored"));
    ManifestBuilder::new()
        .name("dep")
        .script("build", "echo dep")
        .write_to(&root.join("node_modules/dep"));

    std::fs::create_dir_all(root.join("packages/notes")).unwrap();
    std::fs::write(root.join("packages/notes/README.md"), "notes").unwrap();

    dir
}

fn request(dir: &Path, names: &[&str], selection: Selection) -> RunRequest {
    let mut req = RunRequest::new(names.iter().map(|s| s.to_string()).collect(), dir);
    req.selection = selection;
    req
}

fn labels(groups: &[multirun::engine::Group]) -> Vec<String> {
    groups.iter().map(|g| g.label.clone()).collect()
}

#[test]
fn discovers_declared_packages_in_path_order() {
    init_tracing();
    let ws = workspace();
    let fs = RealFileSystem;

    let root = find_workspace_root(&fs, ws.path()).unwrap().unwrap();
    let packages = discover_packages(&fs, &root).unwrap();

    let rel: Vec<&str> = packages.iter().map(|p| p.rel_path.as_str()).collect();
    assert_eq!(rel, vec!["packages/a", "packages/b"]);

    let names: Vec<&str> = packages.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(names, vec!["@acme/a", "packages/b"]);
}

#[test]
fn workspace_root_is_found_from_a_package_subdirectory() {
    let ws = workspace();
    let fs = RealFileSystem;

    let root = find_workspace_root(&fs, &ws.path().join("packages/a")).unwrap().unwrap();
    assert_eq!(root.dir, ws.path());
    assert_eq!(root.manifest.name.as_deref(), Some("root"));
}

#[test]
fn workspaces_runs_every_package_but_the_root() {
    let ws = workspace();
    let groups = build_groups(&request(ws.path(), &["build"], Selection::Workspaces), &RealFileSystem).unwrap();

    assert_eq!(labels(&groups), vec!["@acme/a:build", "packages/b:build"]);
    assert_eq!(groups[0].handles[0].cwd, ws.path().join("packages/a"));
    assert_eq!(groups[1].index, 1);
}

#[test]
fn workspaces_requires_the_script_everywhere() {
    let ws = workspace();
    let err = build_groups(&request(ws.path(), &["test"], Selection::Workspaces), &RealFileSystem)
        .unwrap_err();

    assert!(matches!(err, MultirunError::MissingScript { .. }));
    assert_eq!(err.to_string(), "Missing \"test\" script in package \"@acme/a\"");
    assert!(err.is_usage());
}

#[test]
fn if_present_skips_packages_without_the_script() {
    let ws = workspace();
    let mut req = request(ws.path(), &["test"], Selection::Workspaces);
    req.if_present = true;

    let groups = build_groups(&req, &RealFileSystem).unwrap();
    assert_eq!(labels(&groups), vec!["packages/b:test"]);
}

#[test]
fn filter_includes_the_root_and_skips_missing_scripts() {
    let ws = workspace();

    let all = build_groups(
        &request(ws.path(), &["build"], Selection::Filter(vec!["*".into()])),
        &RealFileSystem,
    )
    .unwrap();
    assert_eq!(labels(&all), vec!["root:build", "@acme/a:build", "packages/b:build"]);

    let tests = build_groups(
        &request(ws.path(), &["test"], Selection::Filter(vec!["*".into()])),
        &RealFileSystem,
    )
    .unwrap();
    assert_eq!(labels(&tests), vec!["packages/b:test"]);
}

#[test]
fn filter_by_name_path_and_negation() {
    let ws = workspace();
    let run = |filters: &[&str]| {
        build_groups(
            &request(
                ws.path(),
                &["build"],
                Selection::Filter(filters.iter().map(|s| s.to_string()).collect()),
            ),
            &RealFileSystem,
        )
        .map(|g| labels(&g))
    };

    assert_eq!(run(&["@acme/*"]).unwrap(), vec!["@acme/a:build"]);
    assert_eq!(run(&["./packages/b"]).unwrap(), vec!["packages/b:build"]);
    assert_eq!(run(&["!@acme/a"]).unwrap(), vec!["root:build", "packages/b:build"]);
    assert_eq!(
        run(&["root", "./packages/b"]).unwrap(),
        vec!["root:build", "packages/b:build"]
    );
}

#[test]
fn filter_matching_nothing_is_an_error() {
    let ws = workspace();
    let err = build_groups(
        &request(ws.path(), &["build"], Selection::Filter(vec!["nope".into()])),
        &RealFileSystem,
    )
    .unwrap_err();

    assert!(matches!(err, MultirunError::NoPackagesMatched));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn package_order_is_outermost() {
    let ws = workspace();
    let mut req = request(ws.path(), &["build", "test"], Selection::Filter(vec!["./packages/*".into()]));
    req.if_present = true;

    let groups = build_groups(&req, &RealFileSystem).unwrap();
    assert_eq!(
        labels(&groups),
        vec!["@acme/a:build", "packages/b:build", "packages/b:test"]
    );
}
