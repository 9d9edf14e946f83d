//! Invocation orchestration: one user action, end to end.
//!
//! The [`Orchestrator`] sequences everything a single "execute plugin
//! method" request needs: capability forwarding, descriptor resolution,
//! the optional open-dialog → invoke → save-dialog → `saveResult`
//! choreography, and the conversion of every failure into a terminal
//! [`InvocationReport`] the UI can always render.
//!
//! Each invocation walks the phases `resolving → (capability-forward |
//! file-selecting) → invoking → (done | output-selecting → saving → done)`
//! and is isolated from every other: a failing flow never mutates the
//! registry or affects other plugins. Dialog cancellations are empty
//! outcomes, not failures. A per-plugin in-flight guard rejects a second
//! method invocation while one is still outstanding; capability forwards
//! are pass-through and not guarded.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::capability::{
    CapabilityClient, HostApi, OpenDialogArgs, SYSTEM_PLUGIN_ID, SaveDialogArgs, is_no_selection,
};
use crate::descriptor::PluginDescriptor;
use crate::error::PluginError;
use crate::normalize::{normalize, normalize_separators};
use crate::process::{DEFAULT_INVOKE_TIMEOUT_SECS, ModuleContext, ModuleExecutor};
use crate::protocol::{
    DEFAULT_ENTRY_METHOD, InvocationTarget, PluginRequest, SAVE_RESULT_METHOD,
    extract_notifications,
};
use crate::registry::PluginRegistry;

/// Tracing target for orchestration.
const ORCHESTRATOR_TARGET: &str = "alcove_plugins::orchestrator";

/// Report message when the user dismisses the open-file dialog.
pub const NO_FILE_SELECTED: &str = "no file selected";

/// Report message when the user dismisses the save-file dialog.
pub const NO_SAVE_LOCATION: &str = "no save location selected";

/// Tunable flow behaviour.
///
/// `always_prompt_output` preserves the shell's historical behaviour of
/// offering the save dialog even when the invocation result declares
/// failure, so users can capture partial output. Turning it off skips the
/// prompt for results carrying `success: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowPolicy {
    always_prompt_output: bool,
    invoke_timeout_secs: u64,
}

impl Default for FlowPolicy {
    fn default() -> Self {
        Self {
            always_prompt_output: true,
            invoke_timeout_secs: DEFAULT_INVOKE_TIMEOUT_SECS,
        }
    }
}

impl FlowPolicy {
    /// Creates the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls whether the save prompt is offered after a failed result.
    #[must_use]
    pub const fn with_always_prompt_output(mut self, always: bool) -> Self {
        self.always_prompt_output = always;
        self
    }

    /// Overrides the module invocation timeout.
    #[must_use]
    pub const fn with_invoke_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.invoke_timeout_secs = timeout_secs;
        self
    }

    /// Returns whether the save prompt ignores a failed result.
    #[must_use]
    pub const fn always_prompt_output(&self) -> bool {
        self.always_prompt_output
    }

    /// Returns the module invocation timeout in seconds.
    #[must_use]
    pub const fn invoke_timeout_secs(&self) -> u64 {
        self.invoke_timeout_secs
    }
}

/// Terminal value of every orchestrator operation.
///
/// `success: false` with a `message` is an empty outcome (a dismissed
/// dialog); `success: false` with an `error` is a failure. A `result` may
/// accompany either; a cancelled save still surfaces the processing
/// result it could not save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationReport {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl InvocationReport {
    /// A completed invocation carrying the plugin's result.
    #[must_use]
    pub const fn completed(result: Value) -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            result: Some(result),
        }
    }

    /// An empty outcome (for example a dismissed dialog).
    #[must_use]
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            error: None,
            result: None,
        }
    }

    /// An empty outcome that still surfaces an earlier result.
    #[must_use]
    pub fn empty_with_result(message: impl Into<String>, result: Value) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            error: None,
            result: Some(result),
        }
    }

    /// A failed invocation with a human-readable error.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            result: None,
        }
    }

    /// Returns whether the invocation completed with a result.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the empty-outcome message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the failure description, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the carried result value, if any.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}

/// Sequences dialog prompts, module invocation, and save round-trips.
///
/// Generic over the module executor and the capability client so both can
/// be substituted in tests.
///
/// # Example
///
/// ```
/// use alcove_plugins::capability::CapabilityBroker;
/// use alcove_plugins::orchestrator::Orchestrator;
/// use alcove_plugins::process::ProcessExecutor;
/// use alcove_plugins::registry::PluginRegistry;
///
/// let registry = PluginRegistry::in_memory("/tmp/plugins");
/// let orchestrator = Orchestrator::new(registry, ProcessExecutor, CapabilityBroker::new());
/// let report = orchestrator.execute("ghost", "run", serde_json::json!({}));
/// assert!(!report.is_success());
/// ```
#[derive(Debug)]
pub struct Orchestrator<E, C> {
    registry: PluginRegistry,
    executor: E,
    capabilities: C,
    policy: FlowPolicy,
    in_flight: Mutex<HashSet<String>>,
}

impl<E, C> Orchestrator<E, C> {
    /// Creates an orchestrator with the default policy.
    #[must_use]
    pub fn new(registry: PluginRegistry, executor: E, capabilities: C) -> Self {
        Self {
            registry,
            executor,
            capabilities,
            policy: FlowPolicy::default(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Replaces the flow policy.
    #[must_use]
    pub fn with_policy(mut self, policy: FlowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the active flow policy.
    #[must_use]
    pub const fn policy(&self) -> &FlowPolicy {
        &self.policy
    }

    /// Returns a reference to the plugin registry.
    #[must_use]
    pub const fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Returns a mutable reference to the plugin registry.
    #[must_use]
    pub const fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    /// Marks `plugin_id` as having a flow outstanding.
    fn claim(&self, plugin_id: &str) -> Result<InFlightGuard<'_>, PluginError> {
        let mut slots = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !slots.insert(plugin_id.to_owned()) {
            return Err(PluginError::Busy {
                id: plugin_id.to_owned(),
            });
        }
        Ok(InFlightGuard {
            slots: &self.in_flight,
            plugin_id: plugin_id.to_owned(),
        })
    }
}

impl<E: ModuleExecutor, C: CapabilityClient> Orchestrator<E, C> {
    /// Runs one logical "execute plugin method" request end to end.
    ///
    /// Never returns an error: every failure is folded into the report so
    /// the caller always has a terminal value to render.
    pub fn execute(&self, plugin_id: &str, method: &str, args: Value) -> InvocationReport {
        let target = InvocationTarget::parse(method);
        match self.run_flow(plugin_id, &target, args) {
            Ok(report) => report,
            Err(error) => {
                warn!(
                    target: ORCHESTRATOR_TARGET,
                    plugin = plugin_id,
                    method,
                    %error,
                    "invocation failed"
                );
                InvocationReport::failed(error.to_string())
            }
        }
    }

    fn run_flow(
        &self,
        plugin_id: &str,
        target: &InvocationTarget,
        args: Value,
    ) -> Result<InvocationReport, PluginError> {
        match target {
            InvocationTarget::Capability(api) => {
                debug!(
                    target: ORCHESTRATOR_TARGET,
                    plugin = plugin_id,
                    api = api.as_str(),
                    phase = "capability-forward",
                    "forwarding capability call"
                );
                let result = self.capabilities.call(plugin_id, api, args)?;
                Ok(InvocationReport::completed(result))
            }
            InvocationTarget::Method(method) => self.run_method_flow(plugin_id, method, args),
        }
    }

    fn run_method_flow(
        &self,
        plugin_id: &str,
        method: &str,
        args: Value,
    ) -> Result<InvocationReport, PluginError> {
        let _guard = self.claim(plugin_id)?;
        let (descriptor, context) = self.resolve(plugin_id)?;

        let mut args = args;
        let is_entry = method == DEFAULT_ENTRY_METHOD;
        if is_entry && descriptor.requires_file_selection() {
            debug!(
                target: ORCHESTRATOR_TARGET,
                plugin = plugin_id,
                phase = "file-selecting",
                "prompting for input file"
            );
            let Some(selected) = self.select_input_file(&descriptor)? else {
                return Ok(InvocationReport::empty(NO_FILE_SELECTED));
            };
            args = merge_selected_path(&selected, args);
        }

        debug!(
            target: ORCHESTRATOR_TARGET,
            plugin = plugin_id,
            method,
            phase = "invoking",
            "invoking module method"
        );
        let request = PluginRequest::new(method, args);
        let result = self.executor.invoke(&context, &request)?;
        self.forward_notifications(plugin_id, &result);

        if is_entry
            && descriptor.requires_output_file_selection()
            && self.should_prompt_output(&result)
        {
            return self.run_save_flow(&descriptor, &context, result);
        }

        Ok(InvocationReport::completed(result))
    }

    fn run_save_flow(
        &self,
        descriptor: &PluginDescriptor,
        context: &ModuleContext,
        result: Value,
    ) -> Result<InvocationReport, PluginError> {
        debug!(
            target: ORCHESTRATOR_TARGET,
            plugin = descriptor.id(),
            phase = "output-selecting",
            "prompting for save location"
        );
        let Some(selected) = self.select_output_file(descriptor)? else {
            return Ok(InvocationReport::empty_with_result(NO_SAVE_LOCATION, result));
        };

        let output_path = normalize_separators(&selected);
        let normalized = normalize(&result)?;
        debug!(
            target: ORCHESTRATOR_TARGET,
            plugin = descriptor.id(),
            source = %normalized.source(),
            output_path = %output_path,
            phase = "saving",
            "invoking saveResult"
        );
        let (content, stats) = normalized.into_parts();
        let save_args = json!({
            "content": content,
            "stats": stats,
            "outputPath": output_path,
        });
        let request = PluginRequest::new(SAVE_RESULT_METHOD, save_args);
        let saved = self.executor.invoke(context, &request)?;
        self.forward_notifications(descriptor.id(), &saved);
        Ok(InvocationReport::completed(saved))
    }

    /// Resolves a loaded plugin into its descriptor and execution context.
    fn resolve(&self, plugin_id: &str) -> Result<(PluginDescriptor, ModuleContext), PluginError> {
        let entry = self
            .registry
            .get(plugin_id)
            .ok_or_else(|| PluginError::Unavailable {
                id: plugin_id.to_owned(),
                reason: String::from("not installed"),
            })?;
        if !entry.status().is_loaded() {
            return Err(PluginError::Unavailable {
                id: plugin_id.to_owned(),
                reason: entry
                    .status()
                    .error()
                    .unwrap_or("module not loaded")
                    .to_owned(),
            });
        }
        let context = ModuleContext::new(plugin_id, entry.entry_path(), entry.install_dir())
            .with_timeout_secs(self.policy.invoke_timeout_secs());
        Ok((entry.descriptor().clone(), context))
    }

    /// Prompts for an input file; `None` means the user cancelled.
    fn select_input_file(
        &self,
        descriptor: &PluginDescriptor,
    ) -> Result<Option<String>, PluginError> {
        let args = OpenDialogArgs::new(
            format!("Select a file to process with {}", descriptor.title()),
            descriptor.file_filters().to_vec(),
        );
        let value = self.capabilities.call(
            SYSTEM_PLUGIN_ID,
            HostApi::OpenFileDialog.as_str(),
            to_args_value(&args)?,
        )?;
        dialog_path(HostApi::OpenFileDialog, &value)
    }

    /// Prompts for a save location; `None` means the user cancelled.
    fn select_output_file(
        &self,
        descriptor: &PluginDescriptor,
    ) -> Result<Option<String>, PluginError> {
        let args = SaveDialogArgs::new(
            format!("Save the output of {}", descriptor.title()),
            descriptor.default_output_file_name(),
            descriptor.output_file_filters().to_vec(),
        );
        let value = self.capabilities.call(
            SYSTEM_PLUGIN_ID,
            HostApi::SaveFileDialog.as_str(),
            to_args_value(&args)?,
        )?;
        dialog_path(HostApi::SaveFileDialog, &value)
    }

    /// Whether the save prompt should be offered for this result.
    fn should_prompt_output(&self, result: &Value) -> bool {
        self.policy.always_prompt_output()
            || result.get("success").and_then(Value::as_bool) != Some(false)
    }

    /// Forwards module-attached notifications; failures are logged only.
    fn forward_notifications(&self, plugin_id: &str, result: &Value) {
        for notification in extract_notifications(result) {
            let args = json!({
                "title": notification.title(),
                "message": notification.message(),
            });
            if let Err(error) =
                self.capabilities
                    .call(plugin_id, HostApi::ShowNotification.as_str(), args)
            {
                warn!(
                    target: ORCHESTRATOR_TARGET,
                    plugin = plugin_id,
                    %error,
                    "failed to forward module notification"
                );
            }
        }
    }
}

/// Releases the in-flight slot when an invocation flow ends.
#[derive(Debug)]
struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<String>>,
    plugin_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&self.plugin_id);
    }
}

/// Injects the selected path under `filePath`, then merges the caller's
/// arguments on top so an explicit caller-supplied path wins.
fn merge_selected_path(selected: &str, caller_args: Value) -> Value {
    let mut merged = Map::new();
    merged.insert(
        String::from("filePath"),
        Value::String(selected.to_owned()),
    );
    if let Value::Object(extra) = caller_args {
        for (key, value) in extra {
            merged.insert(key, value);
        }
    }
    Value::Object(merged)
}

/// Serialises typed dialog arguments into the capability args value.
fn to_args_value<T: Serialize>(args: &T) -> Result<Value, PluginError> {
    serde_json::to_value(args).map_err(PluginError::SerializeRequest)
}

/// Interprets a dialog result: `None` for no selection, the path otherwise.
fn dialog_path(api: HostApi, value: &Value) -> Result<Option<String>, PluginError> {
    if is_no_selection(value) {
        return Ok(None);
    }
    value
        .as_str()
        .map(|path| Some(path.to_owned()))
        .ok_or_else(|| PluginError::Capability {
            api: api.as_str().to_owned(),
            message: format!("dialog returned a non-string path: {value}"),
        })
}
