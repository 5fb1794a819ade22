//! Integration tests for Arbor
//!
//! These tests verify that the host, the indexer and the watcher work
//! together, and that the CLI drives them end to end.

use arbor_core::test_utils::{create_repo_with_structure, create_test_repo};
use arbor_host::{AddFileOptions, LanguageHost};
use arbor_watcher::{WatchEvent, WatchOutcome, WatcherService};
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use tokio::sync::Mutex;

fn arbor(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_arbor"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("Failed to execute arbor")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "arbor failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn tracked_paths(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["path"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_arbor"))
        .arg("--help")
        .output()
        .expect("Failed to execute arbor");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Incremental file tracking and import resolution"));
    assert!(stdout.contains("closure"));
}

#[test]
fn test_cli_version() {
    let repo = create_repo_with_structure(&[]);
    let output = arbor(repo.path(), &["version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    insta::assert_snapshot!(stdout.trim(), @"arbor v0.1.0");
}

#[test]
fn test_track_reports_whole_closure() {
    let repo = create_test_repo();
    let output = arbor(repo.path(), &["--json", "track", "src/index.ts"]);
    let tracked = stdout_json(&output);

    let paths = tracked_paths(&tracked);
    assert_eq!(paths.len(), 4);
    for suffix in [
        "src/index.ts",
        "src/util.ts",
        "src/services/user.ts",
        "node_modules/left-pad/index.ts",
    ] {
        assert!(paths.iter().any(|p| p.ends_with(suffix)), "missing {suffix}");
    }
    for entry in tracked.as_array().unwrap() {
        assert_eq!(entry["version"], 1);
    }
}

#[test]
fn test_imports_lists_direct_edges_only() {
    let repo = create_test_repo();
    let output = arbor(repo.path(), &["--json", "imports", "src/services/user.ts"]);
    let edges = stdout_json(&output);

    let edges = edges.as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["raw_path"], "../util");
    assert!(edges[0]["normalized_path"].as_str().unwrap().ends_with("src/util.ts"));
}

#[test]
fn test_closure_prints_graph() {
    let repo = create_test_repo();
    let output = arbor(repo.path(), &["--json", "closure", "src/index.ts"]);
    let graph = stdout_json(&output);

    let files = graph.as_object().unwrap();
    assert_eq!(files.len(), 4);
    let (_, root_edges) = files
        .iter()
        .find(|(path, _)| path.ends_with("src/index.ts"))
        .unwrap();
    let raw: Vec<_> = root_edges
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| edge["raw_path"].as_str().unwrap())
        .collect();
    assert_eq!(raw, vec!["./services/user", "./util", "left-pad"]);
}

#[test]
fn test_config_file_excludes_globs() {
    let repo = create_repo_with_structure(&[
        ("arbor.toml", "excluded_globs = [\"**/vendor/**\"]\n"),
        ("main.ts", "import { x } from './vendor/x';\nimport { y } from './y';\n"),
        ("vendor/x.ts", "export const x = 1;\n"),
        ("y.ts", "export const y = 2;\n"),
    ]);
    let output = arbor(repo.path(), &["--json", "track", "main.ts"]);
    let paths = tracked_paths(&stdout_json(&output));

    assert_eq!(paths.len(), 2);
    assert!(paths.iter().all(|p| !p.contains("/vendor/")));
}

#[test]
fn test_invalid_config_is_reported() {
    let repo = create_repo_with_structure(&[
        ("arbor.toml", "excluded_files = [\"(unclosed\"]\n"),
        ("main.ts", "export const a = 1;\n"),
    ]);
    let output = arbor(repo.path(), &["track", "main.ts"]);
    assert!(!output.status.success());
}

#[test]
fn test_index_honours_ignore_files() {
    let repo = create_test_repo();
    std::fs::write(repo.path().join(".ignore"), "node_modules/\n").unwrap();

    let output = arbor(repo.path(), &["--json", "index"]);
    let paths = tracked_paths(&stdout_json(&output));

    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|p| !p.contains("node_modules")));
}

/// Host, watcher and reference engine sharing one view of a repository
#[tokio::test]
async fn test_watcher_keeps_queries_current() {
    let repo = create_repo_with_structure(&[
        ("main.ts", "import { greet } from './greet';\ngreet();\n"),
        ("greet.ts", "export function greet() {}\n"),
    ]);
    let main = repo.path().join("main.ts");
    let greet = repo.path().join("greet.ts");

    let mut host = LanguageHost::new(repo.path());
    host.add_file(AddFileOptions::new(main.to_string_lossy()).with_imports())
        .unwrap();
    let greet_name = greet.to_string_lossy().into_owned();
    assert_eq!(host.file_version(&greet_name), 1);

    let host = Arc::new(Mutex::new(host));
    let service = WatcherService::new(repo.path(), Arc::clone(&host)).unwrap();

    std::fs::write(&greet, "\n\nexport function greet(name?: string) {}\n").unwrap();
    let outcome = service
        .apply_event(WatchEvent::Modified(greet.clone()))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        WatchOutcome::Updated {
            path: greet_name.clone(),
            version: 2
        }
    );

    let mut host = host.lock().await;
    let main_name = main.to_string_lossy().into_owned();
    let offset = host.file_content(&main_name).raw_content.find("greet()").unwrap();
    let definitions = host.definition_at(&main_name, offset).unwrap().unwrap();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].file_name, greet_name);
    assert_eq!(definitions[0].text_span.start, 2 + "export function ".len());
}
