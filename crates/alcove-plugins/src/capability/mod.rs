//! Capability dispatch: forwarding named host operations on behalf of plugins.
//!
//! A capability is an operation the host application provides and a plugin
//! may request but not implement itself: file dialogs, clipboard access,
//! notifications, file I/O. The [`CapabilityClient`] trait is the seam the
//! orchestrator calls through; production hosts hand it a
//! [`CapabilityBroker`] with their handlers registered, and tests substitute
//! a mock. There are no retries: a failing host call surfaces once as
//! [`PluginError::Capability`].
//!
//! Dialog capabilities may suspend on user interaction and resolve to JSON
//! `null` (or an empty string) when the user dismisses the dialog. That is
//! "no selection", not an error; see [`is_no_selection`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PluginError;

/// Reserved plugin id for capabilities not scoped to a specific plugin,
/// such as the generic open/save dialogs. Routes identically to a
/// plugin-scoped call.
pub const SYSTEM_PLUGIN_ID: &str = "system";

/// Well-known capability names on the host surface.
///
/// Dispatch itself is by name, so hosts may register capabilities beyond
/// this set; the enum exists so callers spell the canonical names once.
///
/// # Example
///
/// ```
/// use alcove_plugins::capability::HostApi;
///
/// assert_eq!(HostApi::OpenFileDialog.as_str(), "openFileDialog");
/// assert_eq!(HostApi::ShowNotification.to_string(), "showNotification");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostApi {
    /// Modal file-open dialog; resolves to a path or null.
    OpenFileDialog,
    /// Modal file-save dialog; resolves to a path or null.
    SaveFileDialog,
    /// Modal folder-picker dialog; resolves to a path or null.
    OpenFolderDialog,
    /// Shows a user-facing notification.
    ShowNotification,
    /// Reads a file on the plugin's behalf.
    ReadFile,
    /// Writes a file on the plugin's behalf.
    WriteFile,
    /// Spreadsheet processing, delegated to an external service.
    ProcessExcel,
    /// Image conversion, delegated to an external service.
    ConvertImage,
    /// Reads the clipboard text.
    GetClipboardText,
    /// Replaces the clipboard text.
    SetClipboardText,
    /// Reports host platform information.
    GetSystemInfo,
}

impl HostApi {
    /// Returns the canonical capability name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenFileDialog => "openFileDialog",
            Self::SaveFileDialog => "saveFileDialog",
            Self::OpenFolderDialog => "openFolderDialog",
            Self::ShowNotification => "showNotification",
            Self::ReadFile => "readFile",
            Self::WriteFile => "writeFile",
            Self::ProcessExcel => "processExcel",
            Self::ConvertImage => "convertImage",
            Self::GetClipboardText => "getClipboardText",
            Self::SetClipboardText => "setClipboardText",
            Self::GetSystemInfo => "getSystemInfo",
        }
    }
}

impl fmt::Display for HostApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch seam for host capability calls.
///
/// Implementations forward the named call to the host surface and return its
/// raw result unchanged. Injected into the orchestrator rather than reached
/// through process-global state, so tests can substitute a fake.
pub trait CapabilityClient {
    /// Forwards one capability call on behalf of `plugin_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Capability`] when the host surface rejects or
    /// cannot serve the call. A dialog dismissed by the user is NOT an
    /// error; it resolves to `null`.
    fn call(&self, plugin_id: &str, api: &str, args: Value) -> Result<Value, PluginError>;
}

/// Handler signature stored by the broker: `(plugin_id, args) -> result`.
type CapabilityHandler = Box<dyn Fn(&str, Value) -> Result<Value, PluginError> + Send + Sync>;

/// Named-handler registry implementing [`CapabilityClient`].
///
/// The embedding host registers one handler per capability name; dispatch
/// looks the name up and invokes it with the requesting plugin id. Unknown
/// names fail with [`PluginError::Capability`].
///
/// # Example
///
/// ```
/// use alcove_plugins::capability::{CapabilityBroker, CapabilityClient};
/// use serde_json::{Value, json};
///
/// let mut broker = CapabilityBroker::new();
/// broker.register("getClipboardText", |_plugin, _args| {
///     Ok(Value::String("copied text".into()))
/// });
///
/// let result = broker.call("phrasebook", "getClipboardText", json!({}))?;
/// assert_eq!(result, Value::String("copied text".into()));
/// # Ok::<(), alcove_plugins::PluginError>(())
/// ```
#[derive(Default)]
pub struct CapabilityBroker {
    handlers: HashMap<String, CapabilityHandler>,
}

impl CapabilityBroker {
    /// Creates a broker with no handlers registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the handler for a capability name.
    pub fn register<F>(&mut self, api: impl Into<String>, handler: F)
    where
        F: Fn(&str, Value) -> Result<Value, PluginError> + Send + Sync + 'static,
    {
        self.handlers.insert(api.into(), Box::new(handler));
    }

    /// Returns whether a handler is registered for `api`.
    #[must_use]
    pub fn contains(&self, api: &str) -> bool {
        self.handlers.contains_key(api)
    }
}

impl fmt::Debug for CapabilityBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CapabilityBroker")
            .field("handlers", &names)
            .finish()
    }
}

impl CapabilityClient for CapabilityBroker {
    fn call(&self, plugin_id: &str, api: &str, args: Value) -> Result<Value, PluginError> {
        tracing::debug!(
            target: "alcove_plugins::capability",
            plugin = plugin_id,
            api,
            "dispatching capability call"
        );
        let handler = self.handlers.get(api).ok_or_else(|| PluginError::Capability {
            api: api.to_owned(),
            message: String::from("no handler registered"),
        })?;
        handler(plugin_id, args)
    }
}

/// Arguments for the `openFileDialog` and `openFolderDialog` capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogArgs {
    title: String,
    #[serde(default)]
    filters: Vec<String>,
}

impl OpenDialogArgs {
    /// Creates open-dialog arguments.
    #[must_use]
    pub fn new(title: impl Into<String>, filters: Vec<String>) -> Self {
        Self {
            title: title.into(),
            filters,
        }
    }

    /// Returns the dialog title.
    #[must_use]
    pub const fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the extension filters (empty means any file).
    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }
}

/// Arguments for the `saveFileDialog` capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDialogArgs {
    title: String,
    default_name: String,
    #[serde(default)]
    filters: Vec<String>,
}

impl SaveDialogArgs {
    /// Creates save-dialog arguments.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        default_name: impl Into<String>,
        filters: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            default_name: default_name.into(),
            filters,
        }
    }

    /// Returns the dialog title.
    #[must_use]
    pub const fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the suggested file name.
    #[must_use]
    pub const fn default_name(&self) -> &str {
        self.default_name.as_str()
    }

    /// Returns the extension filters (empty means any file).
    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }
}

/// Returns `true` when a dialog result means the user made no selection.
///
/// Hosts encode dismissal as JSON `null`; an empty string is tolerated as
/// the same outcome.
#[must_use]
pub fn is_no_selection(value: &Value) -> bool {
    value.is_null() || value.as_str().is_some_and(str::is_empty)
}

#[cfg(test)]
mod tests;
