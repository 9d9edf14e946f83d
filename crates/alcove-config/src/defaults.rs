//! Default values and path resolution for the configuration layer.

use std::path::PathBuf;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default timeout budget for one module invocation.
pub const DEFAULT_INVOKE_TIMEOUT_SECS: u64 = 30;

/// Directory holding Alcove's configuration file.
///
/// `{config_dir}/alcove`, falling back to a relative `alcove` directory when
/// the platform reports no config directory.
#[must_use]
pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alcove")
}

/// Default plugins install root: `{config_dir}/alcove/plugins`.
#[must_use]
pub fn default_plugins_dir() -> PathBuf {
    config_root().join("plugins")
}
