//! Annotate plugin: line-numbered listings of source files.
//!
//! This crate implements a one-shot module compatible with
//! `alcove-plugins`. The module reads exactly one JSONL request from stdin,
//! dispatches on the method name, and writes one JSON response line to
//! stdout. `run` turns the file at `filePath` into an annotated listing;
//! `saveResult` writes previously produced content to the chosen output
//! path. The package declares both file selection and output selection, so
//! the shell drives the full open → run → save choreography around it.


use std::io::{BufRead, Write};
use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

use alcove_plugins::protocol::PluginRequest;

/// Marker opening an annotated listing.
const LISTING_HEADER: &str = "/* alcove annotated listing */";

/// Marker closing an annotated listing.
const LISTING_FOOTER: &str = "/* end of listing */";

/// Errors raised while dispatching module requests.
#[derive(Debug, Error)]
pub enum PluginDispatchError {
    /// Writing the response to stdout failed.
    #[error("failed to write module response: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Serialising the response payload failed.
    #[error("failed to serialise module response: {source}")]
    Serialize {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}

/// Produces the annotated listing for one source text.
///
/// Every line is prefixed with its one-based number; the listing is wrapped
/// in header and footer markers.
///
/// # Example
///
/// ```
/// use alcove_plugin_annotate::annotate;
///
/// let (listing, lines) = annotate("let x = 1;\nlet y = 2;");
/// assert_eq!(lines, 2);
/// assert!(listing.contains("1 | let x = 1;"));
/// assert!(listing.contains("2 | let y = 2;"));
/// ```
#[must_use]
pub fn annotate(source: &str) -> (String, usize) {
    let mut lines = 0usize;
    let mut listing = String::from(LISTING_HEADER);
    listing.push('\n');
    for (index, line) in source.lines().enumerate() {
        lines = index + 1;
        listing.push_str(&format!("{lines} | {line}\n"));
    }
    listing.push_str(LISTING_FOOTER);
    listing.push('\n');
    (listing, lines)
}

/// Executes one module request from `stdin` and writes one response to
/// `stdout`.
///
/// # Errors
///
/// Returns an error only when the response cannot be serialised or written;
/// request-level problems are reported inside the response payload.
pub fn run(stdin: &mut impl BufRead, stdout: &mut impl Write) -> Result<(), PluginDispatchError> {
    let response = match read_request(stdin) {
        Ok(request) => dispatch(&request),
        Err(message) => failure_response(&message),
    };

    let payload =
        serde_json::to_string(&response).map_err(|source| PluginDispatchError::Serialize {
            source,
        })?;
    stdout
        .write_all(payload.as_bytes())
        .and_then(|()| stdout.write_all(b"\n"))
        .and_then(|()| stdout.flush())
        .map_err(|source| PluginDispatchError::Write { source })
}

fn read_request(stdin: &mut impl BufRead) -> Result<PluginRequest, String> {
    let mut line = String::new();
    let bytes_read = stdin
        .read_line(&mut line)
        .map_err(|error| format!("failed to read request: {error}"))?;
    if bytes_read == 0 {
        return Err(String::from("module request was empty"));
    }
    serde_json::from_str(line.trim()).map_err(|error| format!("invalid request JSON: {error}"))
}

fn dispatch(request: &PluginRequest) -> Value {
    match request.method() {
        "run" => run_annotation(request.args()),
        "saveResult" => save_result(request.args()),
        other => failure_response(&format!("unsupported method '{other}'")),
    }
}

fn run_annotation(args: &Value) -> Value {
    // Both historical argument spellings are in the wild.
    let Some(file_path) = args
        .get("filePath")
        .or_else(|| args.get("file_path"))
        .and_then(Value::as_str)
    else {
        return json!({"success": false, "message": "no file path provided"});
    };

    let source = match std::fs::read_to_string(file_path) {
        Ok(text) => text,
        Err(error) => {
            return failure_response(&format!("failed to read '{file_path}': {error}"));
        }
    };

    let (listing, lines) = annotate(&source);
    json!({
        "success": true,
        "result": {
            "content": listing,
            "stats": {
                "lines": lines,
                "bytes": source.len(),
                "source": file_path,
            },
        },
        "notifications": [{
            "title": "Annotate",
            "message": format!("annotated {lines} lines from {file_path}"),
        }],
    })
}

fn save_result(args: &Value) -> Value {
    let Some(content) = args.get("content").and_then(Value::as_str) else {
        return failure_response("saveResult requires 'content'");
    };
    let Some(output_path) = args.get("outputPath").and_then(Value::as_str) else {
        return failure_response("saveResult requires 'outputPath'");
    };

    if let Some(parent) = Path::new(output_path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                return failure_response(&format!(
                    "failed to create '{}': {error}",
                    parent.display()
                ));
            }
        }
    }
    if let Err(error) = std::fs::write(output_path, content) {
        return failure_response(&format!("failed to write '{output_path}': {error}"));
    }

    json!({
        "success": true,
        "outputPath": output_path,
        "size": content.len(),
        "stats": args.get("stats").cloned().unwrap_or_else(|| json!({})),
    })
}

fn failure_response(message: &str) -> Value {
    json!({"success": false, "error": message})
}
