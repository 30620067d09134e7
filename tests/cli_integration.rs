//! CLI integration tests for taskgraph
//!
//! These tests verify the complete workflow from initialization through
//! dependency edits and the schedule queries.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command instance for the taskgraph binary
fn taskgraph_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("taskgraph"));
    cmd.env_remove("TASKGRAPH_LOG");
    cmd
}

/// Create a temporary directory and initialize a taskgraph project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    taskgraph_cmd().arg("init").arg(dir.path()).assert().success();
    dir
}

/// Add a task with an explicit id inside a project
fn add_task(dir: &TempDir, id: &str, extra: &[&str]) {
    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "add", &format!("Task {}", id), "--id", id])
        .args(extra)
        .assert()
        .success();
}

/// Parse stdout of a successful JSON command
fn json_output(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = taskgraph_cmd()
        .current_dir(dir.path())
        .args(["--format", "json"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    taskgraph_cmd()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized taskgraph project"));

    assert!(dir.path().join(".taskgraph").is_dir());
    assert!(dir.path().join(".taskgraph/config.toml").is_file());
    assert!(dir.path().join(".taskgraph/tasks.jsonl").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    taskgraph_cmd().arg("init").arg(dir.path()).assert().success();
    taskgraph_cmd().arg("init").arg(dir.path()).assert().success();
}

#[test]
fn test_commands_outside_project_fail() {
    let dir = TempDir::new().unwrap();

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("ready")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a taskgraph project"));
}

// =============================================================================
// Task Tests
// =============================================================================

#[test]
fn test_task_add_and_list() {
    let dir = setup_project();

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "add", "Design schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created task: t-"));

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Design schema"));
}

#[test]
fn test_task_add_rejects_missing_dependency() {
    let dir = setup_project();

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "add", "Build API", "--dep", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dependency not found: nope"));
}

#[test]
fn test_task_add_rejects_duplicate_id() {
    let dir = setup_project();
    add_task(&dir, "a", &[]);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "add", "Again", "--id", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task already exists: a"));
}

#[test]
fn test_task_dep_refuses_cycle() {
    let dir = setup_project();
    add_task(&dir, "a", &[]);
    add_task(&dir, "b", &["--dep", "a"]);
    add_task(&dir, "c", &["--dep", "b"]);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "dep", "a", "c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency detected"));

    // Store is unchanged
    let tasks = json_output(&dir, &["task", "list"]);
    assert_eq!(tasks[0]["id"], "a");
    assert_eq!(tasks[0]["dependencies"], serde_json::json!([]));
}

#[test]
fn test_task_dep_and_undep() {
    let dir = setup_project();
    add_task(&dir, "a", &[]);
    add_task(&dir, "b", &[]);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "dep", "b", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("b now depends on a"));

    let blocked = json_output(&dir, &["blocked"]);
    assert_eq!(blocked[0]["id"], "b");
    assert_eq!(blocked[0]["blockedBy"][0], "a");

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "undep", "b", "a"])
        .assert()
        .success();

    let blocked = json_output(&dir, &["blocked"]);
    assert_eq!(blocked.as_array().unwrap().len(), 0);
}

#[test]
fn test_task_status_unblocks_dependents() {
    let dir = setup_project();
    add_task(&dir, "a", &[]);
    add_task(&dir, "b", &["--dep", "a"]);

    let ready = json_output(&dir, &["ready"]);
    assert_eq!(ready.as_array().unwrap().len(), 1);
    assert_eq!(ready[0]["id"], "a");

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "status", "a", "done"])
        .assert()
        .success();

    let ready = json_output(&dir, &["ready"]);
    assert_eq!(ready.as_array().unwrap().len(), 1);
    assert_eq!(ready[0]["id"], "b");
}

#[test]
fn test_task_show_reports_blockers() {
    let dir = setup_project();
    add_task(&dir, "a", &[]);
    add_task(&dir, "b", &["--dep", "a"]);

    let shown = json_output(&dir, &["task", "show", "b"]);
    assert_eq!(shown["canStart"], false);
    assert_eq!(shown["blockedBy"][0], "a");
    assert_eq!(shown["validation"]["valid"], true);
}

#[test]
fn test_task_remove_warns_about_dependents() {
    let dir = setup_project();
    add_task(&dir, "a", &[]);
    add_task(&dir, "b", &["--dep", "a"]);

    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "remove", "a"])
        .assert()
        .success()
        .stderr(predicate::str::contains("b still depends on removed task a"));

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Dependency not found: a"));
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_validate_clean_project() {
    let dir = setup_project();
    add_task(&dir, "a", &[]);
    add_task(&dir, "b", &["--dep", "a"]);

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 error(s)"));
}

#[test]
fn test_order_follows_dependencies() {
    let dir = setup_project();
    add_task(&dir, "c", &[]);
    add_task(&dir, "a", &[]);
    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["task", "dep", "c", "a"])
        .assert()
        .success();

    let order = json_output(&dir, &["order"]);
    assert_eq!(order["order"], serde_json::json!(["a", "c"]));
    assert_eq!(order["fallback"], false);
}

#[test]
fn test_critical_path_json() {
    let dir = setup_project();
    add_task(&dir, "a", &["--start", "2024-01-01", "--due", "2024-01-06"]);
    add_task(&dir, "b", &["--start", "2024-01-06", "--due", "2024-01-09", "--dep", "a"]);
    add_task(&dir, "c", &["--start", "2024-01-09", "--due", "2024-01-11", "--dep", "b"]);

    let report = json_output(&dir, &["critical-path", "--start", "2024-01-01"]);
    assert_eq!(report["projectDuration"], 10);
    assert_eq!(report["criticalPath"].as_array().unwrap().len(), 3);
    assert_eq!(report["taskDetails"][2]["earliestStart"], 8);
    assert_eq!(report["taskDetails"][2]["slack"], 0);
    assert!(report["projectEnd"].as_str().unwrap().starts_with("2024-01-11"));
}

#[test]
fn test_gantt_json_has_bars_and_arrows() {
    let dir = setup_project();
    add_task(&dir, "a", &["--start", "2024-01-01", "--due", "2024-01-05"]);
    add_task(&dir, "b", &["--start", "2024-01-05", "--due", "2024-01-11", "--dep", "a"]);

    let chart = json_output(&dir, &["gantt"]);
    assert_eq!(chart["bars"].as_array().unwrap().len(), 2);
    assert_eq!(chart["bars"][0]["left"], 0.0);
    assert_eq!(chart["arrows"].as_array().unwrap().len(), 1);
    assert_eq!(chart["arrows"][0]["from"], "a");
    assert_eq!(chart["arrows"][0]["to"], "b");
}

#[test]
fn test_gantt_without_dates_needs_schedule() {
    let dir = setup_project();
    add_task(&dir, "a", &[]);

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("gantt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--schedule"));

    let chart = json_output(&dir, &["gantt", "--schedule", "--from", "2024-01-01"]);
    assert_eq!(chart["bars"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Snapshot File Tests
// =============================================================================

#[test]
fn test_file_json_cycle_reports_all_members() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"[
  {"id": "a", "name": "A", "dependencies": ["c"]},
  {"id": "b", "name": "B", "dependencies": ["a"]},
  {"id": "c", "name": "C", "dependencies": ["b"]}
]"#,
    )
    .unwrap();

    let output = taskgraph_cmd()
        .current_dir(dir.path())
        .args(["--format", "json", "--file"])
        .arg(&path)
        .arg("validate")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    for report in reports.as_array().unwrap() {
        assert_eq!(report["valid"], false);
        assert!(report["errors"][0]
            .as_str()
            .unwrap()
            .starts_with("Circular dependency detected"));
    }

    // The sorter falls back to input order
    taskgraph_cmd()
        .current_dir(dir.path())
        .args(["--format", "json", "--file"])
        .arg(&path)
        .arg("order")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"fallback":true,"order":["a","b","c"]}"#));

    // The calculator refuses
    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("--file")
        .arg(&path)
        .arg("critical-path")
        .assert()
        .failure()
        .stderr(predicate::str::contains("circular dependencies"));
}

#[test]
fn test_file_yaml_ready() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.yaml");
    fs::write(
        &path,
        "- id: a\n  name: A\n  status: completed\n- id: b\n  name: B\n  dependencies: [a]\n- id: c\n  name: C\n  dependencies: [b]\n",
    )
    .unwrap();

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("--file")
        .arg(&path)
        .arg("ready")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready tasks (1)"))
        .stdout(predicate::str::contains("B"));
}

#[test]
fn test_file_is_read_only() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.json");
    fs::write(&path, r#"[{"id": "a", "name": "A"}]"#).unwrap();

    taskgraph_cmd()
        .current_dir(dir.path())
        .arg("--file")
        .arg(&path)
        .args(["task", "add", "B"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only snapshot"));
}
