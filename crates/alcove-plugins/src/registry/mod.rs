//! Plugin registry: the on-disk install root and its in-memory snapshot.
//!
//! The [`PluginRegistry`] owns the session's list of installed plugins as
//! `(descriptor, runtime status)` pairs keyed by id, in insertion order.
//! Install copies a plugin package into the root (`{root}/{id}/`), uninstall
//! removes it, and [`PluginRegistry::refresh`] rebuilds the whole snapshot
//! from disk; the last loaded list wins, and readers never observe a
//! partially updated registry.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::descriptor::{PluginDescriptor, PluginRuntimeStatus};
use crate::error::PluginError;

/// Tracing target for registry operations.
const REGISTRY_TARGET: &str = "alcove_plugins::registry";

/// One installed plugin: descriptor, load status, and its package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    descriptor: PluginDescriptor,
    status: PluginRuntimeStatus,
    install_dir: PathBuf,
}

impl RegistryEntry {
    /// Returns the validated descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Returns the module load status.
    #[must_use]
    pub const fn status(&self) -> &PluginRuntimeStatus {
        &self.status
    }

    /// Returns the plugin's package directory.
    #[must_use]
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Returns the resolved entry point path inside the package directory.
    #[must_use]
    pub fn entry_path(&self) -> PathBuf {
        self.install_dir.join(self.descriptor.main())
    }
}

/// Ordered registry of installed plugins backed by a directory on disk.
///
/// # Example
///
/// ```no_run
/// use alcove_plugins::registry::PluginRegistry;
///
/// let registry = PluginRegistry::open("/home/user/.config/alcove/plugins")?;
/// for (descriptor, status) in registry.list() {
///     println!("{} loaded={}", descriptor.id(), status.is_loaded());
/// }
/// # Ok::<(), alcove_plugins::PluginError>(())
/// ```
#[derive(Debug)]
pub struct PluginRegistry {
    root: PathBuf,
    entries: IndexMap<String, RegistryEntry>,
}

impl PluginRegistry {
    /// Opens the registry rooted at `root`, creating the directory if needed
    /// and scanning it for installed plugins.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Storage`] if the root cannot be created or read.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PluginError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| PluginError::Storage {
            message: format!("failed to create plugins root '{}'", root.display()),
            source: Some(Arc::new(err)),
        })?;
        let mut registry = Self {
            root,
            entries: IndexMap::new(),
        };
        registry.refresh()?;
        Ok(registry)
    }

    /// Creates an in-memory registry over `root` without touching the disk.
    ///
    /// Intended for embedding and tests that register descriptors
    /// programmatically via [`PluginRegistry::register`].
    #[must_use]
    pub fn in_memory(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: IndexMap::new(),
        }
    }

    /// Returns the plugins root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuilds the snapshot from disk, replacing all entries wholesale.
    ///
    /// Package directories with an unreadable or invalid manifest are
    /// skipped with a warning, matching the startup scan behaviour of the
    /// shell. Duplicate ids across directories keep the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Storage`] if the root directory cannot be read.
    pub fn refresh(&mut self) -> Result<(), PluginError> {
        let reader = fs::read_dir(&self.root).map_err(|err| PluginError::Storage {
            message: format!("failed to read plugins root '{}'", self.root.display()),
            source: Some(Arc::new(err)),
        })?;

        let mut entries = IndexMap::new();
        for dir_entry in reader.flatten() {
            let path = dir_entry.path();
            if !path.is_dir() {
                continue;
            }
            match PluginDescriptor::from_dir(&path) {
                Ok(descriptor) => {
                    let id = descriptor.id().to_owned();
                    if entries.contains_key(&id) {
                        warn!(
                            target: REGISTRY_TARGET,
                            plugin = %id,
                            dir = %path.display(),
                            "duplicate plugin id during scan, keeping first occurrence"
                        );
                        continue;
                    }
                    let entry = build_entry(descriptor, path);
                    entries.insert(id, entry);
                }
                Err(err) => {
                    warn!(
                        target: REGISTRY_TARGET,
                        dir = %path.display(),
                        error = %err,
                        "skipping plugin directory with invalid manifest"
                    );
                }
            }
        }

        debug!(
            target: REGISTRY_TARGET,
            count = entries.len(),
            "registry snapshot rebuilt"
        );
        self.entries = entries;
        Ok(())
    }

    /// Installs the plugin package at `source` by copying it into the root.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Descriptor`] for a missing or invalid manifest,
    /// [`PluginError::DuplicateId`] when the id is already installed, and
    /// [`PluginError::Storage`] when the package cannot be copied.
    pub fn install(&mut self, source: &Path) -> Result<PluginDescriptor, PluginError> {
        if !source.is_dir() {
            return Err(PluginError::Descriptor {
                message: format!("plugin path '{}' does not exist", source.display()),
            });
        }

        let descriptor = PluginDescriptor::from_dir(source)?;
        if self.entries.contains_key(descriptor.id()) {
            return Err(PluginError::DuplicateId {
                id: descriptor.id().to_owned(),
            });
        }

        let target = self.root.join(descriptor.id());
        if target.exists() {
            // Stale directory from an earlier install of the same id.
            fs::remove_dir_all(&target).map_err(|err| PluginError::Storage {
                message: format!("failed to clear stale directory '{}'", target.display()),
                source: Some(Arc::new(err)),
            })?;
        }
        copy_dir_all(source, &target).map_err(|err| PluginError::Storage {
            message: format!(
                "failed to copy plugin package '{}' into '{}'",
                source.display(),
                target.display()
            ),
            source: Some(Arc::new(err)),
        })?;

        debug!(
            target: REGISTRY_TARGET,
            plugin = descriptor.id(),
            dir = %target.display(),
            "plugin installed"
        );
        let entry = build_entry(descriptor.clone(), target);
        self.entries.insert(descriptor.id().to_owned(), entry);
        Ok(descriptor)
    }

    /// Registers an already-materialised plugin without copying files.
    ///
    /// The entry's load status is resolved from the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::DuplicateId`] when the id is already present.
    pub fn register(
        &mut self,
        descriptor: PluginDescriptor,
        install_dir: impl Into<PathBuf>,
    ) -> Result<(), PluginError> {
        if self.entries.contains_key(descriptor.id()) {
            return Err(PluginError::DuplicateId {
                id: descriptor.id().to_owned(),
            });
        }
        let id = descriptor.id().to_owned();
        let entry = build_entry(descriptor, install_dir.into());
        self.entries.insert(id, entry);
        Ok(())
    }

    /// Uninstalls a plugin, removing its entry and package directory.
    ///
    /// Retrying a completed uninstall reports [`PluginError::NotFound`]
    /// again; callers treat that as non-fatal.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for an unknown id and
    /// [`PluginError::Storage`] when the directory cannot be removed.
    pub fn uninstall(&mut self, id: &str) -> Result<(), PluginError> {
        let entry = self
            .entries
            .shift_remove(id)
            .ok_or_else(|| PluginError::NotFound { id: id.to_owned() })?;

        if entry.install_dir.exists() {
            fs::remove_dir_all(&entry.install_dir).map_err(|err| PluginError::Storage {
                message: format!(
                    "failed to remove plugin directory '{}'",
                    entry.install_dir.display()
                ),
                source: Some(Arc::new(err)),
            })?;
        }
        debug!(target: REGISTRY_TARGET, plugin = id, "plugin uninstalled");
        Ok(())
    }

    /// Looks up an installed plugin by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    /// Iterates `(descriptor, status)` pairs in insertion order.
    pub fn list(&self) -> impl Iterator<Item = (&PluginDescriptor, &PluginRuntimeStatus)> {
        self.entries
            .values()
            .map(|entry| (&entry.descriptor, &entry.status))
    }

    /// Returns the number of installed plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no plugins are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves the load status for a descriptor rooted at `install_dir`.
fn build_entry(descriptor: PluginDescriptor, install_dir: PathBuf) -> RegistryEntry {
    let entry_path = install_dir.join(descriptor.main());
    let status = if entry_path.is_file() {
        PluginRuntimeStatus::ready()
    } else {
        PluginRuntimeStatus::failed(format!("entry file '{}' not found", entry_path.display()))
    };
    RegistryEntry {
        descriptor,
        status,
        install_dir,
    }
}

/// Recursively copies a plugin package directory.
fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
