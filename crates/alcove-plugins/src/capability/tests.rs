//! Unit tests for capability dispatch.

use rstest::rstest;
use serde_json::{Value, json};

use super::{
    CapabilityBroker, CapabilityClient, HostApi, OpenDialogArgs, SYSTEM_PLUGIN_ID, SaveDialogArgs,
    is_no_selection,
};
use crate::error::PluginError;

#[test]
fn broker_dispatches_registered_handler() {
    let mut broker = CapabilityBroker::new();
    broker.register("getSystemInfo", |_plugin, _args| Ok(json!({"os": "linux"})));

    let result = broker
        .call("annotate", "getSystemInfo", json!({}))
        .expect("dispatch succeeds");
    assert_eq!(result, json!({"os": "linux"}));
}

#[test]
fn broker_rejects_unregistered_api() {
    let broker = CapabilityBroker::new();
    let err = broker
        .call("annotate", "teleport", json!({}))
        .expect_err("unknown api rejected");
    assert!(matches!(err, PluginError::Capability { api, .. } if api == "teleport"));
}

#[test]
fn handler_sees_requesting_plugin_id_and_args() {
    let mut broker = CapabilityBroker::new();
    broker.register("echo", |plugin, args| {
        Ok(json!({"plugin": plugin, "args": args}))
    });

    let result = broker
        .call("phrasebook", "echo", json!({"n": 1}))
        .expect("dispatch succeeds");
    assert_eq!(result, json!({"plugin": "phrasebook", "args": {"n": 1}}));
}

#[test]
fn system_scope_routes_like_any_other_plugin_id() {
    let mut broker = CapabilityBroker::new();
    broker.register("openFileDialog", |plugin, _args| {
        Ok(Value::String(format!("seen:{plugin}")))
    });

    let system = broker
        .call(SYSTEM_PLUGIN_ID, "openFileDialog", json!({}))
        .expect("system-scoped call succeeds");
    assert_eq!(system, Value::String(String::from("seen:system")));

    let scoped = broker
        .call("annotate", "openFileDialog", json!({}))
        .expect("plugin-scoped call succeeds");
    assert_eq!(scoped, Value::String(String::from("seen:annotate")));
}

#[test]
fn handler_failures_propagate_unchanged() {
    let mut broker = CapabilityBroker::new();
    broker.register("readFile", |_plugin, _args| {
        Err(PluginError::Capability {
            api: String::from("readFile"),
            message: String::from("permission denied"),
        })
    });

    let err = broker
        .call("annotate", "readFile", json!({}))
        .expect_err("handler failure propagates");
    assert!(err.to_string().contains("permission denied"));
}

#[rstest]
#[case::open(HostApi::OpenFileDialog, "openFileDialog")]
#[case::save(HostApi::SaveFileDialog, "saveFileDialog")]
#[case::folder(HostApi::OpenFolderDialog, "openFolderDialog")]
#[case::notify(HostApi::ShowNotification, "showNotification")]
#[case::read(HostApi::ReadFile, "readFile")]
#[case::write(HostApi::WriteFile, "writeFile")]
#[case::excel(HostApi::ProcessExcel, "processExcel")]
#[case::image(HostApi::ConvertImage, "convertImage")]
#[case::clip_get(HostApi::GetClipboardText, "getClipboardText")]
#[case::clip_set(HostApi::SetClipboardText, "setClipboardText")]
#[case::sysinfo(HostApi::GetSystemInfo, "getSystemInfo")]
fn host_api_canonical_names(#[case] api: HostApi, #[case] expected: &str) {
    assert_eq!(api.as_str(), expected);
}

#[rstest]
#[case::null(Value::Null, true)]
#[case::empty_string(json!(""), true)]
#[case::path(json!("C:/tmp/file.txt"), false)]
#[case::object(json!({"path": "x"}), false)]
#[case::boolean(json!(false), false)]
fn no_selection_detection(#[case] value: Value, #[case] expected: bool) {
    assert_eq!(is_no_selection(&value), expected);
}

#[test]
fn dialog_args_serialise_camel_case() {
    let open = OpenDialogArgs::new("Pick a file", vec![String::from(".txt")]);
    let value = serde_json::to_value(&open).expect("serialise open args");
    assert_eq!(value, json!({"title": "Pick a file", "filters": [".txt"]}));

    let save = SaveDialogArgs::new("Save output", "out.txt", Vec::new());
    let value = serde_json::to_value(&save).expect("serialise save args");
    assert_eq!(
        value,
        json!({"title": "Save output", "defaultName": "out.txt", "filters": []})
    );
}
