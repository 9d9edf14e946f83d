//! Plugin descriptor types and manifest parsing.
//!
//! A [`PluginDescriptor`] is the validated, canonical record of one installed
//! plugin: its identity, entry point, and the capability needs it declares
//! (file selection before the entry method runs, output-file selection after
//! it). Descriptors are produced from a package manifest (`plugin.json`, or
//! the legacy `package.json` name) and normalised exactly once at parse
//! time, so no runtime code ever branches on manifest spelling.
//!
//! Two historical spellings are accepted for every capability field
//! (`requiresFileSelection` and `requires_file_selection`, and so on), and a
//! small fixed set of plugin ids that shipped before the selection flags
//! existed is force-migrated to declare both selections.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// Canonical manifest file name inside a plugin package directory.
pub const DESCRIPTOR_FILE: &str = "plugin.json";

/// Legacy manifest file name, still accepted when `plugin.json` is absent.
pub const LEGACY_DESCRIPTOR_FILE: &str = "package.json";

/// Fallback output file name when a manifest declares output selection
/// without a default.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "output.txt";

/// Plugin ids that predate the selection flags and are migrated to declare
/// both file and output-file selection regardless of their manifests.
const FORCED_SELECTION_IDS: &[&str] = &["excel-processor", "demo-plugin"];

/// Validated descriptor of one installed plugin.
///
/// # Example
///
/// ```
/// use alcove_plugins::descriptor::PluginDescriptor;
///
/// let descriptor = PluginDescriptor::new("annotate", "Annotate", "1.0.0", "annotate-bin")
///     .with_display_name("Source Annotator")
///     .with_file_selection(vec![".js".into(), ".ts".into()]);
///
/// assert_eq!(descriptor.id(), "annotate");
/// assert_eq!(descriptor.title(), "Source Annotator");
/// assert!(descriptor.requires_file_selection());
/// assert!(!descriptor.requires_output_file_selection());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    version: String,
    #[serde(default)]
    description: String,
    main: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    requires_file_selection: bool,
    file_filters: Vec<String>,
    requires_output_file_selection: bool,
    output_file_filters: Vec<String>,
    default_output_file_name: String,
}

impl PluginDescriptor {
    /// Creates a minimal descriptor with no selection requirements.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        main: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: None,
            version: version.into(),
            description: String::new(),
            main: main.into(),
            author: None,
            requires_file_selection: false,
            file_filters: Vec::new(),
            requires_output_file_selection: false,
            output_file_filters: Vec::new(),
            default_output_file_name: String::from(DEFAULT_OUTPUT_FILE_NAME),
        }
    }

    /// Sets the human-facing display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the author field.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Declares that the entry method needs a file selected up front.
    #[must_use]
    pub fn with_file_selection(mut self, filters: Vec<String>) -> Self {
        self.requires_file_selection = true;
        self.file_filters = filters;
        self
    }

    /// Declares that the entry method's result is offered a save dialog.
    #[must_use]
    pub fn with_output_selection(
        mut self,
        filters: Vec<String>,
        default_file_name: impl Into<String>,
    ) -> Self {
        self.requires_output_file_selection = true;
        self.output_file_filters = filters;
        self.default_output_file_name = default_file_name.into();
        self
    }

    /// Parses and normalises a descriptor from manifest JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Descriptor`] if the text is not valid JSON or
    /// any of the required fields (`id`, `name`, `version`, `main`) is
    /// missing or empty.
    pub fn from_manifest_str(manifest: &str) -> Result<Self, PluginError> {
        let raw: RawDescriptor =
            serde_json::from_str(manifest).map_err(|err| PluginError::Descriptor {
                message: format!("malformed manifest JSON: {err}"),
            })?;
        raw.normalise()
    }

    /// Reads and normalises a descriptor from a plugin package directory.
    ///
    /// Looks for [`DESCRIPTOR_FILE`], then [`LEGACY_DESCRIPTOR_FILE`].
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Descriptor`] when no manifest is present, the
    /// manifest cannot be read, or validation fails.
    pub fn from_dir(dir: &Path) -> Result<Self, PluginError> {
        let path = [DESCRIPTOR_FILE, LEGACY_DESCRIPTOR_FILE]
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| PluginError::Descriptor {
                message: format!(
                    "no {DESCRIPTOR_FILE} or {LEGACY_DESCRIPTOR_FILE} in '{}'",
                    dir.display()
                ),
            })?;

        let manifest = fs::read_to_string(&path).map_err(|err| PluginError::Descriptor {
            message: format!("failed to read '{}': {err}", path.display()),
        })?;
        Self::from_manifest_str(&manifest)
    }

    /// Returns the unique plugin id.
    #[must_use]
    pub const fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the plugin name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the display name, if declared.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the human-facing title: display name when declared, else name.
    #[must_use]
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns the plugin version.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns the free-text description.
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the entry point path, relative to the package directory.
    #[must_use]
    pub const fn main(&self) -> &str {
        self.main.as_str()
    }

    /// Returns the author, if declared.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Returns whether the entry method needs a file selected up front.
    #[must_use]
    pub const fn requires_file_selection(&self) -> bool {
        self.requires_file_selection
    }

    /// Returns the input file filters (extensions; empty means any file).
    #[must_use]
    pub fn file_filters(&self) -> &[String] {
        &self.file_filters
    }

    /// Returns whether the entry method's result is offered a save dialog.
    #[must_use]
    pub const fn requires_output_file_selection(&self) -> bool {
        self.requires_output_file_selection
    }

    /// Returns the output file filters (extensions; empty means any file).
    #[must_use]
    pub fn output_file_filters(&self) -> &[String] {
        &self.output_file_filters
    }

    /// Returns the default file name suggested by the save dialog.
    #[must_use]
    pub const fn default_output_file_name(&self) -> &str {
        self.default_output_file_name.as_str()
    }
}

/// Raw manifest shape, tolerant of both historical field spellings.
///
/// Everything is optional here; `normalise` rejects what the canonical
/// descriptor cannot live without and fills defaults for the rest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "display_name")]
    display_name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default, alias = "requires_file_selection")]
    requires_file_selection: Option<bool>,
    #[serde(default, alias = "file_filters")]
    file_filters: Option<Vec<String>>,
    #[serde(default, alias = "requires_output_file_selection")]
    requires_output_file_selection: Option<bool>,
    #[serde(default, alias = "output_file_filters")]
    output_file_filters: Option<Vec<String>>,
    #[serde(default, alias = "default_output_file_name")]
    default_output_file_name: Option<String>,
}

impl RawDescriptor {
    /// Applies validation, defaults, and the legacy-id migration.
    fn normalise(self) -> Result<PluginDescriptor, PluginError> {
        let id = required(self.id, "id")?;
        let name = required(self.name, "name")?;
        let version = required(self.version, "version")?;
        let main = required(self.main, "main")?;

        let forced = FORCED_SELECTION_IDS.contains(&id.as_str());

        Ok(PluginDescriptor {
            id,
            name,
            display_name: self.display_name.filter(|value| !value.is_empty()),
            version,
            description: self.description.unwrap_or_default(),
            main,
            author: self.author.filter(|value| !value.is_empty()),
            requires_file_selection: forced || self.requires_file_selection.unwrap_or(false),
            file_filters: self.file_filters.unwrap_or_default(),
            requires_output_file_selection: forced
                || self.requires_output_file_selection.unwrap_or(false),
            output_file_filters: self.output_file_filters.unwrap_or_default(),
            default_output_file_name: self
                .default_output_file_name
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| String::from(DEFAULT_OUTPUT_FILE_NAME)),
        })
    }
}

/// Rejects a missing or empty required manifest field.
fn required(value: Option<String>, field: &str) -> Result<String, PluginError> {
    value
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| PluginError::Descriptor {
            message: format!("missing required field '{field}'"),
        })
}

/// Load state of an installed plugin's module.
///
/// `loaded` is resolved when the registry locates the package's entry file;
/// a missing entry leaves the plugin installed but unavailable, with the
/// failure recorded in `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRuntimeStatus {
    loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl PluginRuntimeStatus {
    /// Status of a successfully loaded module.
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            loaded: true,
            error: None,
        }
    }

    /// Status of a module that failed to load.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            loaded: false,
            error: Some(error.into()),
        }
    }

    /// Returns whether the module loaded successfully.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns the load failure message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
