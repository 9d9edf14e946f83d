//! Process-based plugin module execution.
//!
//! [`ProcessExecutor`] implements the [`ModuleExecutor`] trait by spawning
//! the plugin's entry executable from its package directory, writing the
//! request to stdin as a single JSONL line, reading one response line from
//! stdout, and enforcing a timeout while waiting for exit. Module loading
//! and sandboxing live host-side; this executor assumes the entry path has
//! already been resolved by the registry.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::PluginError;
use crate::protocol::{PluginRequest, parse_response_line};

/// Tracing target for module process operations.
const PROCESS_TARGET: &str = "alcove_plugins::process";

/// Default timeout budget for one module invocation.
pub const DEFAULT_INVOKE_TIMEOUT_SECS: u64 = 30;

/// Everything an executor needs to know to invoke one plugin module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleContext {
    plugin_id: String,
    entry: PathBuf,
    working_dir: PathBuf,
    timeout_secs: u64,
}

impl ModuleContext {
    /// Creates a context with the default timeout.
    #[must_use]
    pub fn new(
        plugin_id: impl Into<String>,
        entry: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            entry: entry.into(),
            working_dir: working_dir.into(),
            timeout_secs: DEFAULT_INVOKE_TIMEOUT_SECS,
        }
    }

    /// Overrides the timeout budget.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Returns the plugin id.
    #[must_use]
    pub const fn plugin_id(&self) -> &str {
        self.plugin_id.as_str()
    }

    /// Returns the entry executable path.
    #[must_use]
    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Returns the working directory (the plugin's package directory).
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Returns the timeout budget in seconds.
    #[must_use]
    pub const fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

/// Trait abstracting module invocation for testability.
///
/// The production implementation is [`ProcessExecutor`]; test code
/// implements this trait to return pre-configured responses without
/// spawning real processes.
///
/// # Example
///
/// ```
/// use alcove_plugins::process::{ModuleContext, ModuleExecutor};
/// use alcove_plugins::protocol::PluginRequest;
/// use alcove_plugins::PluginError;
/// use serde_json::{Value, json};
///
/// struct StubExecutor;
///
/// impl ModuleExecutor for StubExecutor {
///     fn invoke(
///         &self,
///         _context: &ModuleContext,
///         _request: &PluginRequest,
///     ) -> Result<Value, PluginError> {
///         Ok(json!({"success": true}))
///     }
/// }
/// ```
pub trait ModuleExecutor {
    /// Invokes one module method and returns the raw response value.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginError`] if the module cannot be spawned, times
    /// out, exits with a non-zero status, or produces invalid output.
    fn invoke(&self, context: &ModuleContext, request: &PluginRequest)
    -> Result<Value, PluginError>;
}

/// Executes plugin modules as short-lived child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl ModuleExecutor for ProcessExecutor {
    fn invoke(
        &self,
        context: &ModuleContext,
        request: &PluginRequest,
    ) -> Result<Value, PluginError> {
        invoke_process(context, request)
    }
}

/// Spawns the module process, writes the request, reads the response.
fn invoke_process(context: &ModuleContext, request: &PluginRequest) -> Result<Value, PluginError> {
    let id = context.plugin_id();

    if !context.entry().is_file() {
        return Err(PluginError::SpawnFailed {
            id: id.to_owned(),
            message: format!("entry file '{}' not found", context.entry().display()),
            source: None,
        });
    }

    debug!(
        target: PROCESS_TARGET,
        plugin = id,
        entry = %context.entry().display(),
        method = request.method(),
        "spawning module process"
    );

    let mut child = Command::new(context.entry())
        .current_dir(context.working_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| PluginError::SpawnFailed {
            id: id.to_owned(),
            message: format!("failed to spawn '{}'", context.entry().display()),
            source: Some(Arc::new(err)),
        })?;

    let stdin = child.stdin.take().ok_or_else(|| PluginError::SpawnFailed {
        id: id.to_owned(),
        message: String::from("failed to capture stdin"),
        source: None,
    })?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| PluginError::SpawnFailed {
            id: id.to_owned(),
            message: String::from("failed to capture stdout"),
            source: None,
        })?;
    let stderr = child.stderr.take();

    write_request(id, stdin, request)?;
    let response_line = read_response(id, stdout, context.timeout_secs())?;
    drain_stderr(id, stderr);
    wait_for_exit(id, &mut child, context.timeout_secs())?;
    parse_response_line(id, &response_line)
}

/// Writes the serialised request to the module's stdin and closes the pipe.
fn write_request(id: &str, mut stdin: impl Write, request: &PluginRequest) -> Result<(), PluginError> {
    let line = request.to_jsonl()?;

    debug!(
        target: PROCESS_TARGET,
        plugin = id,
        request_bytes = line.len(),
        "writing request to module stdin"
    );

    stdin
        .write_all(line.as_bytes())
        .and_then(|()| stdin.flush())
        .map_err(|err| PluginError::Io {
            id: id.to_owned(),
            source: Arc::new(err),
        })
    // Stdin drops here, closing the pipe to signal no more input.
}

/// Reads a single JSONL line from the module's stdout.
fn read_response(id: &str, stdout: impl Read, timeout_secs: u64) -> Result<String, PluginError> {
    let start = Instant::now();
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();

    // The read blocks until the module writes its line or closes stdout;
    // the hard timeout is enforced by the exit wait below.
    let bytes_read = reader.read_line(&mut line).map_err(|err| PluginError::Io {
        id: id.to_owned(),
        source: Arc::new(err),
    })?;

    let elapsed = start.elapsed();
    debug!(
        target: PROCESS_TARGET,
        plugin = id,
        bytes_read,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "read response from module stdout"
    );

    if bytes_read == 0 {
        return Err(PluginError::InvalidOutput {
            id: id.to_owned(),
            message: String::from("module produced no output on stdout"),
        });
    }
    if elapsed > Duration::from_secs(timeout_secs) {
        return Err(PluginError::Timeout {
            id: id.to_owned(),
            timeout_secs,
        });
    }

    Ok(line)
}

/// Drains stderr to the log so the child cannot block on a full pipe.
fn drain_stderr(id: &str, stderr_handle: Option<impl Read>) {
    let Some(reader) = stderr_handle else {
        return;
    };
    let mut buffer = String::new();
    if BufReader::new(reader).read_to_string(&mut buffer).is_ok() && !buffer.is_empty() {
        debug!(
            target: PROCESS_TARGET,
            plugin = id,
            stderr = %buffer.trim(),
            "module stderr output"
        );
    }
}

/// Waits for the child to exit, enforcing the timeout.
fn wait_for_exit(id: &str, child: &mut Child, timeout_secs: u64) -> Result<(), PluginError> {
    let start = Instant::now();
    let timeout = Duration::from_secs(timeout_secs);
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(
                    target: PROCESS_TARGET,
                    plugin = id,
                    ?status,
                    "module process exited"
                );
                if status.success() {
                    return Ok(());
                }
                return Err(PluginError::NonZeroExit {
                    id: id.to_owned(),
                    status: status.code().unwrap_or(-1),
                });
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    warn!(
                        target: PROCESS_TARGET,
                        plugin = id,
                        timeout_secs,
                        "module timed out, killing process"
                    );
                    drop(child.kill());
                    drop(child.wait());
                    return Err(PluginError::Timeout {
                        id: id.to_owned(),
                        timeout_secs,
                    });
                }
                std::thread::sleep(poll_interval);
            }
            Err(err) => {
                return Err(PluginError::Io {
                    id: id.to_owned(),
                    source: Arc::new(err),
                });
            }
        }
    }
}
