//! Wire types for host-module communication.
//!
//! A plugin module is a short-lived process: the host writes one
//! [`PluginRequest`] as a single JSONL line to the module's stdin and closes
//! it; the module writes one JSON line to stdout and exits. Responses carry
//! no fixed schema: plugin authors return whatever shape suits them, from a
//! bare string to nested result objects, so the host parses them into a raw
//! [`serde_json::Value`] and defers interpretation to the normalizer.
//!
//! Invocation names are split into two channels before anything is
//! dispatched: names carrying the historical `appApi_` marker are capability
//! forwards handled entirely host-side, everything else is a module method.
//! [`InvocationTarget::parse`] performs that split exactly once, at the
//! boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PluginError;

/// Default entry method every plugin module is expected to export.
pub const DEFAULT_ENTRY_METHOD: &str = "run";

/// Method invoked with `{ content, stats, outputPath }` after a save dialog.
pub const SAVE_RESULT_METHOD: &str = "saveResult";

/// Historical marker prefix routing an invocation to the capability channel.
pub const CAPABILITY_PREFIX: &str = "appApi_";

/// The two dispatch channels an invocation name can resolve to.
///
/// # Example
///
/// ```
/// use alcove_plugins::protocol::InvocationTarget;
///
/// let target = InvocationTarget::parse("appApi_showNotification");
/// assert_eq!(target, InvocationTarget::Capability("showNotification".into()));
///
/// let target = InvocationTarget::parse("run");
/// assert_eq!(target, InvocationTarget::Method("run".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationTarget {
    /// Forward to the host capability surface; the module is never touched.
    Capability(String),
    /// Invoke a module method through the executor.
    Method(String),
}

impl InvocationTarget {
    /// Splits a raw invocation name into its dispatch channel.
    ///
    /// A bare `appApi_` with nothing after the marker names no capability
    /// and is treated as an (oddly named) module method.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(CAPABILITY_PREFIX) {
            Some(api) if !api.is_empty() => Self::Capability(api.to_owned()),
            _ => Self::Method(raw.to_owned()),
        }
    }

    /// Returns `true` for the capability channel.
    #[must_use]
    pub const fn is_capability(&self) -> bool {
        matches!(self, Self::Capability(_))
    }
}

/// Request written to a module's stdin as one JSONL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRequest {
    method: String,
    #[serde(default)]
    args: Value,
}

impl PluginRequest {
    /// Creates a request for the given method and arguments object.
    #[must_use]
    pub fn new(method: impl Into<String>, args: Value) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the arguments value.
    #[must_use]
    pub const fn args(&self) -> &Value {
        &self.args
    }

    /// Serialises the request as a newline-terminated JSONL line.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::SerializeRequest`] if serialisation fails.
    pub fn to_jsonl(&self) -> Result<String, PluginError> {
        let mut line = serde_json::to_string(self).map_err(PluginError::SerializeRequest)?;
        line.push('\n');
        Ok(line)
    }
}

/// Parses one response line from a module's stdout.
///
/// The line must be valid JSON but may be any JSON value; a bare string is
/// a legitimate plugin result.
///
/// # Errors
///
/// Returns [`PluginError::InvalidOutput`] for an empty line or malformed
/// JSON.
pub fn parse_response_line(plugin_id: &str, line: &str) -> Result<Value, PluginError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(PluginError::InvalidOutput {
            id: plugin_id.to_owned(),
            message: String::from("module produced no output on stdout"),
        });
    }
    serde_json::from_str(trimmed).map_err(|err| PluginError::InvalidOutput {
        id: plugin_id.to_owned(),
        message: format!("module response is not valid JSON: {err}"),
    })
}

/// A user-facing notification a module attaches to its response.
///
/// Modules are one-shot processes and cannot call back into the host
/// mid-method; instead a response may carry a `notifications` array, which
/// the orchestrator forwards to the `showNotification` capability after the
/// method returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    title: String,
    #[serde(default)]
    message: String,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Returns the notification title.
    #[must_use]
    pub const fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the notification body.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Extracts the `notifications` array from a module response, if present.
///
/// Entries that are not objects are dropped; missing fields default to
/// empty strings.
#[must_use]
pub fn extract_notifications(result: &Value) -> Vec<Notification> {
    result
        .get("notifications")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
