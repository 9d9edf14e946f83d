//! Headless harness for the Alcove plugin layer.
//!
//! The `alcove` binary drives the plugin capability layer without the
//! desktop shell: it loads configuration, installs telemetry, opens the
//! plugin registry, and wires the process executor together with a
//! console-backed host capability surface. Dialog answers that the shell
//! would collect from modal dialogs are supplied as command-line flags; an
//! absent flag behaves like a dismissed dialog.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod host;
mod telemetry;

fn main() -> ExitCode {
    let arguments = cli::Cli::parse();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    match commands::run(arguments, &mut stdout) {
        Ok(code) => code,
        Err(error) => {
            writeln!(stderr, "error: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
