//! Result normalisation: extracting saveable content from loose plugin output.
//!
//! Plugin authors return inconsistent shapes (bare strings, flat objects,
//! results nested under a `result` wrapper), so the save step cannot assume
//! a schema. [`normalize`] applies a fixed priority ladder of field lookups,
//! takes the first rule whose source is present and usable, and never
//! combines sources. The extraction happens exactly once and the output is
//! tagged with the [`ContentSource`] that fired, so downstream code matches
//! on the tag instead of re-sniffing shapes.
//!
//! A content-bearing field only matches when it holds a non-empty string; a
//! stats field counts only when it is a JSON object. When none of the eight
//! rules matches, the result carries nothing worth saving and
//! [`PluginError::Normalization`] stops the flow before any save dialog
//! outcome is acted on.

use serde_json::{Map, Value};

use crate::error::PluginError;

/// Which extraction rule produced a [`NormalizedResult`].
///
/// Ordered by ladder priority; `as_str` yields a stable kebab-case tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSource {
    /// Rule 1: `result.result.content`.
    WrappedContent,
    /// Rule 2: `result.content`.
    TopContent,
    /// Rule 3: `result.data`.
    TopData,
    /// Rule 4: `result.result.data`.
    WrappedData,
    /// Rule 5: `result.result` was itself a string.
    WrappedString,
    /// Rule 6: the whole result was a string.
    BareString,
    /// Rule 7: `result.result` serialised as pretty-printed JSON.
    ObjectDump,
}

impl ContentSource {
    /// Returns the canonical kebab-case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WrappedContent => "wrapped-content",
            Self::TopContent => "top-content",
            Self::TopData => "top-data",
            Self::WrappedData => "wrapped-data",
            Self::WrappedString => "wrapped-string",
            Self::BareString => "bare-string",
            Self::ObjectDump => "object-dump",
        }
    }
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical `{ content, stats }` pair extracted from an invocation result.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    content: String,
    stats: Value,
    source: ContentSource,
}

impl NormalizedResult {
    /// Returns the extracted content.
    #[must_use]
    pub const fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Returns the extracted stats object (`{}` when the rule carries none).
    #[must_use]
    pub const fn stats(&self) -> &Value {
        &self.stats
    }

    /// Returns which rule produced this result.
    #[must_use]
    pub const fn source(&self) -> ContentSource {
        self.source
    }

    /// Consumes the result into its `(content, stats)` parts.
    #[must_use]
    pub fn into_parts(self) -> (String, Value) {
        (self.content, self.stats)
    }
}

/// Extracts saveable `{ content, stats }` from a raw invocation result.
///
/// Applies the eight-rule ladder described in the module docs; first match
/// wins, sources are never combined.
///
/// # Example
///
/// ```
/// use alcove_plugins::normalize::{ContentSource, normalize};
/// use serde_json::json;
///
/// let result = json!({"result": {"content": "A", "stats": {"n": 1}}});
/// let normalized = normalize(&result)?;
/// assert_eq!(normalized.content(), "A");
/// assert_eq!(normalized.stats(), &json!({"n": 1}));
/// assert_eq!(normalized.source(), ContentSource::WrappedContent);
/// # Ok::<(), alcove_plugins::PluginError>(())
/// ```
///
/// # Errors
///
/// Returns [`PluginError::Normalization`] when no rule matches.
pub fn normalize(result: &Value) -> Result<NormalizedResult, PluginError> {
    let wrapped = result.get("result");
    let wrapped_stats = wrapped.and_then(|inner| inner.get("stats"));

    if let Some(content) = non_empty_str(wrapped.and_then(|inner| inner.get("content"))) {
        return Ok(extracted(
            content,
            stats_or_empty(wrapped_stats),
            ContentSource::WrappedContent,
        ));
    }
    if let Some(content) = non_empty_str(result.get("content")) {
        return Ok(extracted(
            content,
            stats_or_empty(result.get("stats")),
            ContentSource::TopContent,
        ));
    }
    if let Some(content) = non_empty_str(result.get("data")) {
        return Ok(extracted(content, empty_stats(), ContentSource::TopData));
    }
    if let Some(content) = non_empty_str(wrapped.and_then(|inner| inner.get("data"))) {
        return Ok(extracted(
            content,
            stats_or_empty(wrapped_stats),
            ContentSource::WrappedData,
        ));
    }
    if let Some(content) = non_empty_str(wrapped) {
        return Ok(extracted(
            content,
            empty_stats(),
            ContentSource::WrappedString,
        ));
    }
    if let Some(content) = non_empty_str(Some(result)) {
        return Ok(extracted(content, empty_stats(), ContentSource::BareString));
    }
    if let Some(inner) = wrapped.filter(|value| !value.is_null()) {
        let dumped =
            serde_json::to_string_pretty(inner).map_err(|err| PluginError::Normalization {
                message: format!("failed to serialise result payload: {err}"),
            })?;
        return Ok(NormalizedResult {
            content: dumped,
            stats: empty_stats(),
            source: ContentSource::ObjectDump,
        });
    }

    Err(PluginError::Normalization {
        message: String::from("none of the recognised result fields were present"),
    })
}

/// Replaces backslash separators with forward slashes.
///
/// A display/comparison normalisation only, with no filesystem access. Applied
/// to save paths before they are handed to `saveResult`. Idempotent.
///
/// # Example
///
/// ```
/// use alcove_plugins::normalize::normalize_separators;
///
/// assert_eq!(normalize_separators("C:\\a\\b.txt"), "C:/a/b.txt");
/// assert_eq!(normalize_separators("already/fine.txt"), "already/fine.txt");
/// ```
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

fn extracted(content: &str, stats: Value, source: ContentSource) -> NormalizedResult {
    NormalizedResult {
        content: content.to_owned(),
        stats,
        source,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

fn stats_or_empty(value: Option<&Value>) -> Value {
    value
        .filter(|candidate| candidate.is_object())
        .cloned()
        .unwrap_or_else(empty_stats)
}

fn empty_stats() -> Value {
    Value::Object(Map::new())
}
