//! Domain errors raised by plugin operations.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.
//!
//! User cancellation of a dialog is deliberately absent from this taxonomy:
//! "no selection" is an empty outcome, not a failure, and is reported through
//! [`InvocationReport`](crate::orchestrator::InvocationReport) instead.

use std::sync::Arc;

use thiserror::Error;

/// Errors arising from plugin operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A plugin descriptor failed validation or could not be parsed.
    #[error("invalid plugin descriptor: {message}")]
    Descriptor {
        /// Description of the validation failure.
        message: String,
    },

    /// A plugin with the same id is already installed.
    #[error("plugin '{id}' is already installed")]
    DuplicateId {
        /// The conflicting plugin id.
        id: String,
    },

    /// The requested plugin is not installed.
    #[error("plugin '{id}' is not installed")]
    NotFound {
        /// Id that was looked up.
        id: String,
    },

    /// The plugin exists but cannot currently serve invocations.
    #[error("plugin '{id}' is unavailable: {reason}")]
    Unavailable {
        /// Plugin id.
        id: String,
        /// Why the plugin cannot be invoked (not installed, load failure).
        reason: String,
    },

    /// The plugin already has an invocation flow outstanding.
    #[error("plugin '{id}' is busy with another invocation")]
    Busy {
        /// Plugin id.
        id: String,
    },

    /// A host capability call failed.
    #[error("capability '{api}' failed: {message}")]
    Capability {
        /// The capability name that was dispatched.
        api: String,
        /// Failure description from the host surface.
        message: String,
    },

    /// The plugin process could not be spawned.
    #[error("plugin '{id}' failed to start: {message}")]
    SpawnFailed {
        /// Plugin id.
        id: String,
        /// Human-readable failure description.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// The plugin did not complete within the configured timeout.
    #[error("plugin '{id}' timed out after {timeout_secs}s")]
    Timeout {
        /// Plugin id.
        id: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The plugin exited with a non-zero status code.
    #[error("plugin '{id}' exited with non-zero status {status}")]
    NonZeroExit {
        /// Plugin id.
        id: String,
        /// Process exit status.
        status: i32,
    },

    /// The plugin produced output that does not conform to the protocol.
    #[error("plugin '{id}' wrote invalid output: {message}")]
    InvalidOutput {
        /// Plugin id.
        id: String,
        /// Description of the protocol violation.
        message: String,
    },

    /// An I/O error occurred while communicating with the plugin process.
    #[error("I/O error communicating with plugin '{id}': {source}")]
    Io {
        /// Plugin id.
        id: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The plugin request could not be serialised to JSON.
    #[error("failed to serialise plugin request: {0}")]
    SerializeRequest(#[source] serde_json::Error),

    /// The registry could not create, copy, or remove plugin storage.
    #[error("plugin storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// No saveable content could be extracted from an invocation result.
    #[error("no content to save: {message}")]
    Normalization {
        /// Why extraction failed.
        message: String,
    },
}
