//! End-to-end tests driving the `alcove` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn alcove() -> Command {
    Command::cargo_bin("alcove").expect("binary builds")
}

/// Writes a plugin package directory with a manifest and entry file.
fn write_package(parent: &Path, id: &str, manifest: &str, script: &str) -> PathBuf {
    let dir = parent.join(id);
    fs::create_dir_all(&dir).expect("create package dir");
    fs::write(dir.join("plugin.json"), manifest).expect("write manifest");
    let entry = dir.join("entry.sh");
    fs::write(&entry, script).expect("write entry");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(&entry).expect("entry metadata").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&entry, permissions).expect("mark entry executable");
    }
    dir
}

fn simple_manifest(id: &str) -> String {
    format!(r#"{{"id": "{id}", "name": "{id}", "version": "1.0.0", "main": "entry.sh"}}"#)
}

#[test]
fn help_prints_usage() {
    alcove()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Drive the Alcove plugin layer"));
}

#[test]
fn list_reports_empty_registry() {
    let tmp = TempDir::new().expect("create temp dir");
    alcove()
        .args(["list", "--plugins-dir"])
        .arg(tmp.path().join("plugins"))
        .assert()
        .success()
        .stdout(predicate::str::contains("no plugins installed"));
}

#[test]
fn install_list_uninstall_roundtrip() {
    let tmp = TempDir::new().expect("create temp dir");
    let plugins = tmp.path().join("plugins");
    let package = write_package(
        tmp.path(),
        "annotate",
        &simple_manifest("annotate"),
        "#!/bin/sh\n",
    );

    alcove()
        .arg("install")
        .arg(&package)
        .arg("--plugins-dir")
        .arg(&plugins)
        .assert()
        .success()
        .stdout(predicate::str::contains("installed annotate v1.0.0"));

    alcove()
        .arg("list")
        .arg("--plugins-dir")
        .arg(&plugins)
        .assert()
        .success()
        .stdout(predicate::str::contains("annotate v1.0.0 [loaded]"));

    alcove()
        .args(["uninstall", "annotate", "--plugins-dir"])
        .arg(&plugins)
        .assert()
        .success()
        .stdout(predicate::str::contains("uninstalled annotate"));

    alcove()
        .arg("list")
        .arg("--plugins-dir")
        .arg(&plugins)
        .assert()
        .success()
        .stdout(predicate::str::contains("no plugins installed"));
}

#[test]
fn duplicate_install_fails() {
    let tmp = TempDir::new().expect("create temp dir");
    let plugins = tmp.path().join("plugins");
    let package = write_package(
        tmp.path(),
        "annotate",
        &simple_manifest("annotate"),
        "#!/bin/sh\n",
    );

    alcove()
        .arg("install")
        .arg(&package)
        .arg("--plugins-dir")
        .arg(&plugins)
        .assert()
        .success();

    alcove()
        .arg("install")
        .arg(&package)
        .arg("--plugins-dir")
        .arg(&plugins)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already installed"));
}

#[test]
fn repeated_uninstall_is_non_fatal() {
    let tmp = TempDir::new().expect("create temp dir");
    alcove()
        .args(["uninstall", "ghost", "--plugins-dir"])
        .arg(tmp.path().join("plugins"))
        .assert()
        .success()
        .stdout(predicate::str::contains("plugin 'ghost' is not installed"));
}

#[test]
fn run_against_unknown_plugin_reports_unavailable() {
    let tmp = TempDir::new().expect("create temp dir");
    alcove()
        .args(["run", "ghost", "--output", "json", "--plugins-dir"])
        .arg(tmp.path().join("plugins"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("unavailable"));
}

#[test]
fn cancelled_file_dialog_is_an_empty_outcome() {
    let tmp = TempDir::new().expect("create temp dir");
    let plugins = tmp.path().join("plugins");
    let manifest = r#"{
        "id": "annotate", "name": "annotate", "version": "1.0.0", "main": "entry.sh",
        "requiresFileSelection": true, "fileFilters": [".js"]
    }"#;
    let package = write_package(tmp.path(), "annotate", manifest, "#!/bin/sh\n");

    alcove()
        .arg("install")
        .arg(&package)
        .arg("--plugins-dir")
        .arg(&plugins)
        .assert()
        .success();

    // No --file answer: the open dialog reports a dismissal and the module
    // is never spawned.
    let output = alcove()
        .args(["run", "annotate", "--output", "json", "--plugins-dir"])
        .arg(&plugins)
        .output()
        .expect("binary runs");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(report.get("success"), Some(&Value::Bool(false)));
    assert_eq!(report.get("message"), Some(&Value::String("no file selected".into())));
}

#[test]
fn call_reaches_the_system_capability_surface() {
    let tmp = TempDir::new().expect("create temp dir");
    let output = alcove()
        .args(["call", "system", "getSystemInfo", "--output", "json", "--plugins-dir"])
        .arg(tmp.path().join("plugins"))
        .output()
        .expect("binary runs");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(report.get("success"), Some(&Value::Bool(true)));
    let result = report.get("result").expect("result present");
    assert_eq!(
        result.get("os"),
        Some(&Value::String(std::env::consts::OS.into()))
    );
}

#[test]
fn unregistered_capability_fails_cleanly() {
    let tmp = TempDir::new().expect("create temp dir");
    alcove()
        .args(["call", "system", "processExcel", "--output", "json", "--plugins-dir"])
        .arg(tmp.path().join("plugins"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("no handler registered"));
}

#[cfg(unix)]
#[test]
fn run_full_choreography_with_a_script_module() {
    let tmp = TempDir::new().expect("create temp dir");
    let plugins = tmp.path().join("plugins");
    let manifest = r#"{
        "id": "annotate", "name": "annotate", "version": "1.0.0", "main": "entry.sh",
        "requiresFileSelection": true,
        "requiresOutputFileSelection": true,
        "outputFileFilters": [".txt"],
        "defaultOutputFileName": "annotated.txt"
    }"#;
    let script = r#"#!/bin/sh
read line
case "$line" in
  *saveResult*) echo '{"success":true,"outputPath":"/tmp/annotated.txt","size":2}' ;;
  *) echo '{"success":true,"result":{"content":"hi","stats":{"lines":1}}}' ;;
esac
"#;
    let package = write_package(tmp.path(), "annotate", manifest, script);

    alcove()
        .arg("install")
        .arg(&package)
        .arg("--plugins-dir")
        .arg(&plugins)
        .assert()
        .success();

    let input = tmp.path().join("input.js");
    fs::write(&input, "let x = 1;\n").expect("write input");

    let output = alcove()
        .args(["run", "annotate", "--output", "json"])
        .arg("--file")
        .arg(&input)
        .arg("--save-to")
        .arg("/tmp/annotated.txt")
        .arg("--plugins-dir")
        .arg(&plugins)
        .output()
        .expect("binary runs");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(report.get("success"), Some(&Value::Bool(true)));
    let result = report.get("result").expect("result present");
    assert_eq!(
        result.get("outputPath"),
        Some(&Value::String("/tmp/annotated.txt".into())),
        "final result comes from saveResult"
    );
}
