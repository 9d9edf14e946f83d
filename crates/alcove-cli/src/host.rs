//! Console-backed host capability surface.
//!
//! The desktop shell implements capabilities with real modal dialogs and
//! system integrations; the harness substitutes deterministic equivalents.
//! Dialog answers come preselected from command-line flags (absent answer =
//! dismissed dialog), notifications go to the log, and the clipboard is an
//! in-process store. Spreadsheet and image processing stay unregistered
//! (remote services only the shell can reach), so calls to them surface the
//! usual capability failure.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};
use tracing::info;

use alcove_plugins::PluginError;
use alcove_plugins::capability::{CapabilityBroker, HostApi};

/// Tracing target for forwarded notifications.
const NOTIFICATION_TARGET: &str = "alcove::notifications";

/// Preselected dialog answers; `None` behaves like a dismissed dialog.
#[derive(Debug, Default, Clone)]
pub(crate) struct DialogAnswers {
    pub(crate) open_file: Option<PathBuf>,
    pub(crate) save_file: Option<PathBuf>,
}

/// Builds the harness capability broker.
pub(crate) fn build_broker(answers: DialogAnswers) -> CapabilityBroker {
    let mut broker = CapabilityBroker::new();
    register_dialogs(&mut broker, answers);
    register_file_io(&mut broker);
    register_notifications(&mut broker);
    register_clipboard(&mut broker);
    register_system_info(&mut broker);
    broker
}

fn path_answer(answer: Option<PathBuf>) -> Value {
    answer
        .map(|path| Value::String(path.to_string_lossy().into_owned()))
        .unwrap_or(Value::Null)
}

fn register_dialogs(broker: &mut CapabilityBroker, answers: DialogAnswers) {
    let open = path_answer(answers.open_file);
    broker.register(HostApi::OpenFileDialog.as_str(), move |_plugin, _args| {
        Ok(open.clone())
    });

    let save = path_answer(answers.save_file);
    broker.register(HostApi::SaveFileDialog.as_str(), move |_plugin, _args| {
        Ok(save.clone())
    });

    // No flag feeds the folder picker; it always reports a dismissal.
    broker.register(HostApi::OpenFolderDialog.as_str(), |_plugin, _args| {
        Ok(Value::Null)
    });
}

/// Pulls a required string field out of capability arguments.
fn required_str(api: HostApi, args: &Value, field: &str) -> Result<String, PluginError> {
    args.get(field)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| PluginError::Capability {
            api: api.as_str().to_owned(),
            message: format!("missing required argument '{field}'"),
        })
}

fn register_file_io(broker: &mut CapabilityBroker) {
    broker.register(HostApi::ReadFile.as_str(), |_plugin, args| {
        let path = required_str(HostApi::ReadFile, &args, "path")?;
        std::fs::read_to_string(&path)
            .map(Value::String)
            .map_err(|err| PluginError::Capability {
                api: HostApi::ReadFile.as_str().to_owned(),
                message: format!("failed to read '{path}': {err}"),
            })
    });

    broker.register(HostApi::WriteFile.as_str(), |_plugin, args| {
        let path = required_str(HostApi::WriteFile, &args, "path")?;
        let content = required_str(HostApi::WriteFile, &args, "content")?;
        let io_failure = |err: std::io::Error| PluginError::Capability {
            api: HostApi::WriteFile.as_str().to_owned(),
            message: format!("failed to write '{path}': {err}"),
        };
        if let Some(parent) = std::path::Path::new(&path).parent() {
            std::fs::create_dir_all(parent).map_err(io_failure)?;
        }
        std::fs::write(&path, &content).map_err(io_failure)?;
        Ok(json!({
            "success": true,
            "outputPath": path,
            "size": content.len(),
        }))
    });
}

fn register_notifications(broker: &mut CapabilityBroker) {
    broker.register(HostApi::ShowNotification.as_str(), |plugin, args| {
        let title = args.get("title").and_then(Value::as_str).unwrap_or("Alcove");
        let message = args.get("message").and_then(Value::as_str).unwrap_or("");
        info!(target: NOTIFICATION_TARGET, plugin, title, message, "notification");
        Ok(Value::Bool(true))
    });
}

fn register_clipboard(broker: &mut CapabilityBroker) {
    let store = Arc::new(Mutex::new(String::new()));

    let reader = Arc::clone(&store);
    broker.register(HostApi::GetClipboardText.as_str(), move |_plugin, _args| {
        let text = reader.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Value::String(text.clone()))
    });

    broker.register(HostApi::SetClipboardText.as_str(), move |_plugin, args| {
        let text = required_str(HostApi::SetClipboardText, &args, "text")?;
        let mut slot = store.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = text;
        Ok(Value::Bool(true))
    });
}

fn register_system_info(broker: &mut CapabilityBroker) {
    broker.register(HostApi::GetSystemInfo.as_str(), |_plugin, _args| {
        let timestamp = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|err| PluginError::Capability {
                api: HostApi::GetSystemInfo.as_str().to_owned(),
                message: format!("failed to format timestamp: {err}"),
            })?;
        Ok(json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": timestamp,
        }))
    });
}
