//! CLI argument definitions for the Alcove harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output rendering for command results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Human,
    /// Raw JSON payloads.
    Json,
}

/// Command-line interface for the Alcove plugin harness.
#[derive(Parser, Debug)]
#[command(
    name = "alcove",
    version,
    about = "Drive the Alcove plugin layer without the desktop shell"
)]
pub(crate) struct Cli {
    /// Path to an alternate configuration file.
    #[arg(long, value_name = "FILE", global = true)]
    pub(crate) config: Option<PathBuf>,
    /// Overrides the plugins install root.
    #[arg(long, value_name = "DIR", global = true)]
    pub(crate) plugins_dir: Option<PathBuf>,
    /// Overrides the tracing filter expression.
    #[arg(long, value_name = "FILTER", global = true)]
    pub(crate) log_filter: Option<String>,
    /// Overrides the log format (`json` or `compact`).
    #[arg(long, value_name = "FORMAT", global = true)]
    pub(crate) log_format: Option<String>,
    /// Controls how command results are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    pub(crate) output: OutputFormat,
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Harness subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Lists installed plugins with their load status.
    List,
    /// Installs the plugin package at the given directory.
    Install {
        /// Directory containing the plugin package.
        path: PathBuf,
    },
    /// Uninstalls a plugin by id.
    Uninstall {
        /// Plugin id to remove.
        id: String,
    },
    /// Executes a plugin method with full dialog choreography.
    Run {
        /// Plugin id to invoke.
        id: String,
        /// Method name (capability forwards use the `appApi_` marker).
        #[arg(long, default_value = "run")]
        method: String,
        /// Arguments object as JSON text.
        #[arg(long, value_name = "JSON")]
        args: Option<String>,
        /// Answer for the open-file dialog; absent means cancelled.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Answer for the save-file dialog; absent means cancelled.
        #[arg(long, value_name = "PATH")]
        save_to: Option<PathBuf>,
    },
    /// Forwards a raw capability call on behalf of a plugin id.
    Call {
        /// Plugin id the call is scoped to (`system` for host-global).
        id: String,
        /// Capability name, for example `getSystemInfo`.
        api: String,
        /// Arguments object as JSON text.
        #[arg(long, value_name = "JSON")]
        args: Option<String>,
    },
}
