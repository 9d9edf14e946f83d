//! Process executor tests against real script modules (Unix only).

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

use crate::error::PluginError;
use crate::process::{ModuleContext, ModuleExecutor, ProcessExecutor};
use crate::protocol::PluginRequest;

/// Writes an executable shell script and returns its path.
fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("entry.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut permissions = fs::metadata(&path).expect("script metadata").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("mark script executable");
    path
}

fn context(dir: &TempDir, entry: PathBuf) -> ModuleContext {
    ModuleContext::new("script", entry, dir.path()).with_timeout_secs(5)
}

#[test]
fn round_trip_with_a_well_behaved_module() {
    let dir = TempDir::new().expect("create temp dir");
    let entry = write_script(
        dir.path(),
        r#"read line
echo '{"success":true,"result":{"content":"hello","stats":{"lines":1}}}'"#,
    );

    let result = ProcessExecutor
        .invoke(
            &context(&dir, entry),
            &PluginRequest::new("run", json!({"filePath": "/tmp/in.js"})),
        )
        .expect("invocation succeeds");
    assert_eq!(
        result,
        json!({"success": true, "result": {"content": "hello", "stats": {"lines": 1}}})
    );
}

#[test]
fn request_line_reaches_the_module_stdin() {
    let dir = TempDir::new().expect("create temp dir");
    // The module echoes the request line back as its response.
    let entry = write_script(dir.path(), r#"read line
printf '%s\n' "$line""#);

    let result = ProcessExecutor
        .invoke(
            &context(&dir, entry),
            &PluginRequest::new("translate", json!({"text": "hello"})),
        )
        .expect("invocation succeeds");
    assert_eq!(result.get("method"), Some(&json!("translate")));
    assert_eq!(result.get("args"), Some(&json!({"text": "hello"})));
}

#[test]
fn bare_string_responses_are_accepted() {
    let dir = TempDir::new().expect("create temp dir");
    let entry = write_script(dir.path(), r#"read line
echo '"just text"'"#);

    let result = ProcessExecutor
        .invoke(&context(&dir, entry), &PluginRequest::new("run", json!({})))
        .expect("invocation succeeds");
    assert_eq!(result, json!("just text"));
}

#[test]
fn non_zero_exit_is_reported() {
    let dir = TempDir::new().expect("create temp dir");
    let entry = write_script(dir.path(), r#"read line
echo '{"partial":true}'
exit 3"#);

    let err = ProcessExecutor
        .invoke(&context(&dir, entry), &PluginRequest::new("run", json!({})))
        .expect_err("failing module rejected");
    assert!(matches!(err, PluginError::NonZeroExit { status: 3, .. }));
}

#[test]
fn silent_module_is_invalid_output() {
    let dir = TempDir::new().expect("create temp dir");
    let entry = write_script(dir.path(), "read line");

    let err = ProcessExecutor
        .invoke(&context(&dir, entry), &PluginRequest::new("run", json!({})))
        .expect_err("silent module rejected");
    assert!(matches!(err, PluginError::InvalidOutput { .. }));
}

#[test]
fn malformed_output_is_invalid_output() {
    let dir = TempDir::new().expect("create temp dir");
    let entry = write_script(dir.path(), r#"read line
echo 'not json'"#);

    let err = ProcessExecutor
        .invoke(&context(&dir, entry), &PluginRequest::new("run", json!({})))
        .expect_err("malformed output rejected");
    assert!(matches!(err, PluginError::InvalidOutput { .. }));
    assert!(err.to_string().contains("not valid JSON"));
}

#[test]
fn slow_module_times_out() {
    let dir = TempDir::new().expect("create temp dir");
    let entry = write_script(dir.path(), r#"read line
sleep 2
echo '{"late":true}'"#);

    let err = ProcessExecutor
        .invoke(
            &ModuleContext::new("script", entry, dir.path()).with_timeout_secs(1),
            &PluginRequest::new("run", json!({})),
        )
        .expect_err("slow module rejected");
    assert!(matches!(err, PluginError::Timeout { timeout_secs: 1, .. }));
}

#[test]
fn stderr_chatter_does_not_break_the_protocol() {
    let dir = TempDir::new().expect("create temp dir");
    let entry = write_script(
        dir.path(),
        r#"read line
echo 'debug chatter' >&2
echo '{"success":true}'"#,
    );

    let result = ProcessExecutor
        .invoke(&context(&dir, entry), &PluginRequest::new("run", json!({})))
        .expect("invocation succeeds");
    assert_eq!(result, json!({"success": true}));
}
