//! Phrasebook plugin: dictionary-backed word lookup.
//!
//! A deliberately small module exercising the plain invocation path: it
//! declares no file or output selection, so the shell invokes it without
//! any dialog choreography. `run` reports plugin information as a bare
//! object (the normalizer's object-dump rule handles it); `translate` maps
//! known English words to French through a fixed phrasebook.


use std::io::{BufRead, Write};

use serde_json::{Value, json};
use thiserror::Error;

use alcove_plugins::protocol::PluginRequest;

/// Fixed word mappings; lookup is lowercase.
const PHRASEBOOK: &[(&str, &str)] = &[
    ("hello", "bonjour"),
    ("world", "monde"),
    ("good", "bon"),
    ("morning", "matin"),
    ("evening", "soir"),
    ("welcome", "bienvenue"),
    ("goodbye", "au revoir"),
    ("computer", "ordinateur"),
    ("software", "logiciel"),
    ("plugin", "greffon"),
    ("system", "système"),
    ("translate", "traduire"),
];

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

/// Translates one text word by word; unknown words pass through.
///
/// Returns the translated text and the number of dictionary hits.
///
/// # Example
///
/// ```
/// use alcove_plugin_phrasebook::translate;
///
/// let (translated, matched) = translate("hello strange world");
/// assert_eq!(translated, "bonjour strange monde");
/// assert_eq!(matched, 2);
/// ```
#[must_use]
pub fn translate(text: &str) -> (String, usize) {
    let mut matched = 0usize;
    let translated: Vec<&str> = text
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            PHRASEBOOK
                .iter()
                .find(|(english, _)| *english == lower)
                .map_or(word, |(_, french)| {
                    matched += 1;
                    *french
                })
        })
        .collect();
    (translated.join(" "), matched)
}

/// Executes one module request from `stdin` and writes one response to
/// `stdout`.
///
/// # Errors
///
/// Returns an error only when the response cannot be serialised or written.
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
        // Plugin information as a bare object, the way early modules did it.
        "run" => json!({
            "name": "Phrasebook",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Dictionary-backed word lookup",
        }),
        "translate" => run_translate(request.args()),
        other => failure_response(&format!("unsupported method '{other}'")),
    }
}

fn run_translate(args: &Value) -> Value {
    let Some(text) = args.get("text").and_then(Value::as_str).filter(|t| !t.is_empty()) else {
        return failure_response("no text to translate");
    };

    let (translated, matched) = translate(text);
    json!({
        "success": true,
        "result": {
            "content": translated,
            "stats": {
                "matched": matched,
                "words": text.split_whitespace().count(),
            },
        },
        "original": text,
    })
}

fn failure_response(message: &str) -> Value {
    json!({"success": false, "error": message})
}
