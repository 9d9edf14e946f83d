//! Plugin capability layer for the Alcove desktop shell.
//!
//! The `alcove-plugins` crate implements everything between a user action in
//! the shell and a plugin module doing work: the on-disk plugin registry,
//! the capability dispatch seam through which plugins reach host-provided
//! operations (dialogs, clipboard, notifications, file I/O), the
//! orchestrator that sequences one invocation end to end, and the result
//! normalizer that extracts saveable content from the loose shapes plugin
//! authors return.
//!
//! Plugin modules are short-lived processes speaking a one-line JSONL
//! protocol over standard I/O: the host writes one request to stdin, the
//! module writes one JSON response to stdout and exits. Method names
//! carrying the historical `appApi_` marker never reach a module; they are
//! forwarded to the host capability surface instead.
//!
//! # Architecture
//!
//! The shell owns an [`Orchestrator`] wired with a [`PluginRegistry`], a
//! [`ModuleExecutor`] (the process-spawning [`ProcessExecutor`] in
//! production), and a [`CapabilityClient`] (a [`CapabilityBroker`] with the
//! host's handlers registered). Every invocation returns a terminal
//! [`InvocationReport`] (failures are folded in, never thrown), so the UI
//! always has something to render.
//!
//! # Example
//!
//! ```no_run
//! use alcove_plugins::capability::CapabilityBroker;
//! use alcove_plugins::orchestrator::Orchestrator;
//! use alcove_plugins::process::ProcessExecutor;
//! use alcove_plugins::registry::PluginRegistry;
//! use serde_json::{Value, json};
//!
//! let registry = PluginRegistry::open("/home/user/.config/alcove/plugins")?;
//! let mut broker = CapabilityBroker::new();
//! broker.register("showNotification", |_plugin, _args| Ok(Value::Bool(true)));
//!
//! let orchestrator = Orchestrator::new(registry, ProcessExecutor, broker);
//! let report = orchestrator.execute("annotate", "run", json!({}));
//! println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
//! # Ok::<(), alcove_plugins::PluginError>(())
//! ```

pub mod capability;
pub mod descriptor;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod process;
pub mod protocol;
pub mod registry;

#[cfg(test)]
mod tests;

pub use self::capability::{CapabilityBroker, CapabilityClient, HostApi, SYSTEM_PLUGIN_ID};
pub use self::descriptor::{PluginDescriptor, PluginRuntimeStatus};
pub use self::error::PluginError;
pub use self::normalize::{ContentSource, NormalizedResult};
pub use self::orchestrator::{FlowPolicy, InvocationReport, Orchestrator};
pub use self::process::{ModuleContext, ModuleExecutor, ProcessExecutor};
pub use self::protocol::{InvocationTarget, Notification, PluginRequest};
pub use self::registry::PluginRegistry;
