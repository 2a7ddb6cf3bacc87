//! Command-line tests for transx
//!
//! These run the real binary against task files written into temporary directories. Only local
//! endpoints and the `true`/`false` utilities stand in for the sync tool, so no network access or
//! rsync installation is needed.

use assert_cmd::Command;
use predicates::prelude::*;

fn write_task(dir: &std::path::Path, task: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("task.json");
    std::fs::write(&path, serde_json::to_string_pretty(task).unwrap()).unwrap();
    path
}

fn transx() -> Command {
    let mut cmd = Command::cargo_bin("transx").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_runs() {
    transx()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--phase"))
        .stdout(predicate::str::contains("--command-timeout"));
}

#[test]
fn test_version_runs() {
    transx().arg("--version").assert().success();
}

#[test]
fn test_task_file_is_required() {
    transx().assert().failure();
}

#[test]
fn test_phase_values() {
    for phase in ["all", "backup", "transfer", "restore"] {
        transx().args(["--phase", phase, "--help"]).assert().success();
    }
    transx()
        .args(["--phase", "cleanup", "task.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cleanup"));
}

#[test]
fn test_command_timeout_accepts_human_durations() {
    transx()
        .args(["--command-timeout", "30min", "--help"])
        .assert()
        .success();
    transx()
        .args(["--command-timeout", "soon", "task.json"])
        .assert()
        .failure();
}

#[test]
fn test_print_mode() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        (serde_json::json!({}), serde_json::json!({}), "local-to-local"),
        (
            serde_json::json!({}),
            serde_json::json!({"hostAddress": "h"}),
            "local-to-remote",
        ),
        (
            serde_json::json!({"hostAddress": "h"}),
            serde_json::json!({}),
            "remote-to-local",
        ),
        (
            serde_json::json!({"username": "u1", "hostAddress": "h1"}),
            serde_json::json!({"username": "u2", "hostAddress": "h2"}),
            "relay",
        ),
    ];
    for (mut source, mut destination, mode) in cases {
        source["dataPath"] = "/src".into();
        destination["dataPath"] = "/dst".into();
        // a backup command that would fail proves nothing is executed
        source["backupCommand"] = "exit 1".into();
        let path = write_task(
            dir.path(),
            &serde_json::json!({"source": source, "destination": destination}),
        );
        transx()
            .arg("--print-mode")
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::diff(format!("{mode}\n")));
    }
}

#[test]
fn test_missing_task_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    transx()
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("nope.json"));
}

#[test]
fn test_invalid_port_fails_before_running_anything() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let path = write_task(
        dir.path(),
        &serde_json::json!({
            "source": {
                "hostAddress": "h",
                "sshPort": 70000,
                "dataPath": "/src",
                "backupCommand": format!("touch {}", marker.display()),
            },
            "destination": {"dataPath": "/dst"},
        }),
    );
    transx()
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("70000"));
    assert!(!marker.exists());
}

#[test]
fn test_quiet_suppresses_errors() {
    let dir = tempfile::tempdir().unwrap();
    transx()
        .arg("--quiet")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_local_migration_with_summary() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("log");
    let path = write_task(
        dir.path(),
        &serde_json::json!({
            "source": {
                "dataPath": "/src",
                "backupCommand": format!("echo backup >> {}", log.display()),
            },
            "destination": {
                "dataPath": "/dst",
                "restoreCommand": format!("echo restore >> {}", log.display()),
            },
            "syncOptions": {"archive": true, "syncToolPath": "true"},
        }),
    );
    transx()
        .arg("--summary")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("mode: local-to-local"))
        .stdout(predicate::str::contains("backup: completed"))
        .stdout(predicate::str::contains("transfer: completed"))
        .stdout(predicate::str::contains("restore: completed"));
    assert_eq!(std::fs::read_to_string(&log).unwrap(), "backup\nrestore\n");
}

#[test]
fn test_single_phase() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("log");
    let path = write_task(
        dir.path(),
        &serde_json::json!({
            "source": {
                "dataPath": "/src",
                "backupCommand": format!("echo backup >> {}", log.display()),
            },
            "destination": {
                "dataPath": "/dst",
                "restoreCommand": format!("echo restore >> {}", log.display()),
            },
            "syncOptions": {"syncToolPath": "false"},
        }),
    );
    transx()
        .args(["--phase", "restore", "--summary"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("backup: not run"))
        .stdout(predicate::str::contains("transfer: not run"));
    assert_eq!(std::fs::read_to_string(&log).unwrap(), "restore\n");
}

#[test]
fn test_failed_transfer_stops_before_restore() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("log");
    let path = write_task(
        dir.path(),
        &serde_json::json!({
            "source": {"dataPath": "/src"},
            "destination": {
                "dataPath": "/dst",
                "restoreCommand": format!("echo restore >> {}", log.display()),
            },
            "syncOptions": {"syncToolPath": "false"},
        }),
    );
    transx()
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("data transfer failed"))
        .stderr(predicate::str::contains("exited with status 1"));
    assert!(!log.exists());
}
