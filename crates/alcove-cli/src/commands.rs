//! Subcommand execution and result rendering.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use serde_json::{Value, json};

use alcove_config::{Config, ConfigError, LogFormat};
use alcove_plugins::PluginError;
use alcove_plugins::orchestrator::{FlowPolicy, InvocationReport, Orchestrator};
use alcove_plugins::process::ProcessExecutor;
use alcove_plugins::registry::PluginRegistry;

use crate::cli::{Cli, CliCommand, OutputFormat};
use crate::host::{self, DialogAnswers};
use crate::telemetry;

/// Errors surfaced by the harness itself (as opposed to invocation
/// outcomes, which are always rendered as reports).
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Telemetry installation failed.
    #[error(transparent)]
    Telemetry(#[from] telemetry::TelemetryError),
    /// A registry operation failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),
    /// The `--args` flag did not carry valid JSON.
    #[error("invalid --args JSON: {message}")]
    Arguments {
        /// Parser diagnostic.
        message: String,
    },
    /// The `--log-format` flag did not name a known format.
    #[error("invalid --log-format value: {0}")]
    Format(alcove_config::LogFormatParseError),
    /// Output could not be serialised.
    #[error("failed to serialise output: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Executes the parsed command line against the given output stream.
pub(crate) fn run(arguments: Cli, out: &mut impl Write) -> Result<ExitCode, CliError> {
    let Cli {
        config,
        plugins_dir,
        log_filter,
        log_format,
        output,
        command,
    } = arguments;

    let config = load_config(config, plugins_dir, log_filter, log_format)?;
    telemetry::initialise(&config)?;

    match command {
        CliCommand::List => list(&config, output, out),
        CliCommand::Install { path } => install(&config, output, out, &path),
        CliCommand::Uninstall { id } => uninstall(&config, output, out, &id),
        CliCommand::Run {
            id,
            method,
            args,
            file,
            save_to,
        } => {
            let answers = DialogAnswers {
                open_file: file,
                save_file: save_to,
            };
            execute(&config, output, out, &id, &method, args, answers)
        }
        CliCommand::Call { id, api, args } => {
            let method = format!("appApi_{api}");
            execute(&config, output, out, &id, &method, args, DialogAnswers::default())
        }
    }
}

/// Loads the configuration file and layers the global flag overrides.
fn load_config(
    config_path: Option<PathBuf>,
    plugins_dir: Option<PathBuf>,
    log_filter: Option<String>,
    log_format: Option<String>,
) -> Result<Config, CliError> {
    let mut config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    if let Some(dir) = plugins_dir {
        config = config.with_plugins_dir(dir);
    }
    if let Some(filter) = log_filter {
        config = config.with_log_filter(filter);
    }
    if let Some(format) = log_format {
        let parsed = LogFormat::from_str(&format).map_err(CliError::Format)?;
        config = config.with_log_format(parsed);
    }
    Ok(config)
}

fn list(
    config: &Config,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<ExitCode, CliError> {
    let registry = PluginRegistry::open(config.plugins_dir())?;
    match output {
        OutputFormat::Json => {
            let items: Vec<Value> = registry
                .list()
                .map(|(descriptor, status)| json!({"descriptor": descriptor, "status": status}))
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&items)?)?;
        }
        OutputFormat::Human => {
            if registry.is_empty() {
                writeln!(out, "no plugins installed")?;
            }
            for (descriptor, status) in registry.list() {
                let state = if status.is_loaded() { "loaded" } else { "error" };
                writeln!(
                    out,
                    "{} v{} [{state}] {}",
                    descriptor.id(),
                    descriptor.version(),
                    descriptor.description()
                )?;
                if let Some(error) = status.error() {
                    writeln!(out, "    {error}")?;
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn install(
    config: &Config,
    output: OutputFormat,
    out: &mut impl Write,
    path: &std::path::Path,
) -> Result<ExitCode, CliError> {
    let mut registry = PluginRegistry::open(config.plugins_dir())?;
    let descriptor = registry.install(path)?;
    match output {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&descriptor)?)?;
        }
        OutputFormat::Human => {
            writeln!(out, "installed {} v{}", descriptor.id(), descriptor.version())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn uninstall(
    config: &Config,
    output: OutputFormat,
    out: &mut impl Write,
    id: &str,
) -> Result<ExitCode, CliError> {
    let mut registry = PluginRegistry::open(config.plugins_dir())?;
    match registry.uninstall(id) {
        Ok(()) => {
            match output {
                OutputFormat::Json => {
                    writeln!(out, "{}", json!({"uninstalled": id}))?;
                }
                OutputFormat::Human => writeln!(out, "uninstalled {id}")?,
            }
            Ok(ExitCode::SUCCESS)
        }
        // A repeated uninstall is non-fatal: report and exit cleanly.
        Err(PluginError::NotFound { .. }) => {
            writeln!(out, "plugin '{id}' is not installed")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => Err(error.into()),
    }
}

fn execute(
    config: &Config,
    output: OutputFormat,
    out: &mut impl Write,
    id: &str,
    method: &str,
    args: Option<String>,
    answers: DialogAnswers,
) -> Result<ExitCode, CliError> {
    let args = parse_args(args)?;
    let registry = PluginRegistry::open(config.plugins_dir())?;
    let broker = host::build_broker(answers);
    let policy = FlowPolicy::new()
        .with_always_prompt_output(config.always_prompt_output())
        .with_invoke_timeout_secs(config.invoke_timeout_secs());
    let orchestrator = Orchestrator::new(registry, ProcessExecutor, broker).with_policy(policy);

    let report = orchestrator.execute(id, method, args);
    render_report(output, out, &report)?;
    Ok(if report.error().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn parse_args(args: Option<String>) -> Result<Value, CliError> {
    match args {
        None => Ok(json!({})),
        Some(text) => serde_json::from_str(&text).map_err(|err| CliError::Arguments {
            message: err.to_string(),
        }),
    }
}

fn render_report(
    output: OutputFormat,
    out: &mut impl Write,
    report: &InvocationReport,
) -> Result<(), CliError> {
    match output {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
        }
        OutputFormat::Human => {
            if report.is_success() {
                writeln!(out, "ok")?;
            } else if let Some(message) = report.message() {
                writeln!(out, "cancelled: {message}")?;
            } else if let Some(error) = report.error() {
                writeln!(out, "failed: {error}")?;
            }
            if let Some(result) = report.result() {
                writeln!(out, "{}", serde_json::to_string_pretty(result)?)?;
            }
        }
    }
    Ok(())
}
