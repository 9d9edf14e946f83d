//! Unit tests for wire types and target parsing.

use rstest::rstest;
use serde_json::{Value, json};

use super::{
    InvocationTarget, Notification, PluginRequest, extract_notifications, parse_response_line,
};
use crate::error::PluginError;

// ---------------------------------------------------------------------------
// Target parsing
// ---------------------------------------------------------------------------

#[rstest]
#[case::notification("appApi_showNotification", "showNotification")]
#[case::dialog("appApi_openFileDialog", "openFileDialog")]
#[case::custom("appApi_convertImage", "convertImage")]
fn marker_names_parse_to_capability_channel(#[case] raw: &str, #[case] api: &str) {
    assert_eq!(
        InvocationTarget::parse(raw),
        InvocationTarget::Capability(api.to_owned())
    );
}

#[rstest]
#[case::entry("run")]
#[case::save("saveResult")]
#[case::custom("translate")]
#[case::bare_marker("appApi_")]
#[case::marker_in_middle("run_appApi_x")]
fn other_names_parse_to_method_channel(#[case] raw: &str) {
    assert_eq!(
        InvocationTarget::parse(raw),
        InvocationTarget::Method(raw.to_owned())
    );
}

#[test]
fn capability_channel_is_flagged() {
    assert!(InvocationTarget::parse("appApi_readFile").is_capability());
    assert!(!InvocationTarget::parse("run").is_capability());
}

// ---------------------------------------------------------------------------
// Request line
// ---------------------------------------------------------------------------

#[test]
fn request_serialises_as_single_jsonl_line() {
    let request = PluginRequest::new("run", json!({"filePath": "/tmp/in.js"}));
    let line = request.to_jsonl().expect("serialises");
    assert!(line.ends_with('\n'));
    assert_eq!(line.matches('\n').count(), 1);

    let parsed: PluginRequest = serde_json::from_str(line.trim()).expect("round-trips");
    assert_eq!(parsed.method(), "run");
    assert_eq!(parsed.args(), &json!({"filePath": "/tmp/in.js"}));
}

#[test]
fn request_args_default_to_null_when_absent() {
    let parsed: PluginRequest =
        serde_json::from_str(r#"{"method": "run"}"#).expect("parses without args");
    assert_eq!(parsed.args(), &Value::Null);
}

// ---------------------------------------------------------------------------
// Response line
// ---------------------------------------------------------------------------

#[test]
fn response_accepts_any_json_shape() {
    let object = parse_response_line("annotate", r#"{"success": true}"#).expect("object parses");
    assert_eq!(object, json!({"success": true}));

    let bare = parse_response_line("annotate", "\"just text\"\n").expect("bare string parses");
    assert_eq!(bare, Value::String(String::from("just text")));
}

#[rstest]
#[case::empty("")]
#[case::whitespace("   \n")]
fn empty_response_is_invalid_output(#[case] line: &str) {
    let err = parse_response_line("annotate", line).expect_err("empty output rejected");
    assert!(matches!(err, PluginError::InvalidOutput { id, .. } if id == "annotate"));
}

#[test]
fn malformed_response_is_invalid_output() {
    let err = parse_response_line("annotate", "not json").expect_err("malformed output rejected");
    assert!(matches!(err, PluginError::InvalidOutput { .. }));
    assert!(err.to_string().contains("not valid JSON"));
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[test]
fn notifications_extracted_from_response() {
    let response = json!({
        "success": true,
        "notifications": [
            {"title": "Annotate", "message": "Annotated 12 lines"},
            {"title": "Annotate", "message": "Done"}
        ]
    });
    let notifications = extract_notifications(&response);
    assert_eq!(
        notifications,
        vec![
            Notification::new("Annotate", "Annotated 12 lines"),
            Notification::new("Annotate", "Done"),
        ]
    );
}

#[test]
fn malformed_notification_entries_are_dropped() {
    let response = json!({
        "notifications": ["not an object", 42, {"title": "Kept", "message": "yes"}]
    });
    let notifications = extract_notifications(&response);
    assert_eq!(notifications, vec![Notification::new("Kept", "yes")]);
}

#[rstest]
#[case::absent(json!({"success": true}))]
#[case::not_array(json!({"notifications": "nope"}))]
#[case::bare_string(json!("just text"))]
fn missing_notifications_yield_empty_list(#[case] response: Value) {
    assert!(extract_notifications(&response).is_empty());
}
