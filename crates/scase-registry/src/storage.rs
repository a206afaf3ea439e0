//! Per-crate JSON files: one `<lowercase name>.json` per crate.

use std::path::{Path, PathBuf};

use scase_plugin_api::PluginItem;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::model::{is_valid_name, Crate};

const EXTENSION: &str = "json";

// ─── File format ────────────────────────────────────────────────────────────

/// On-disk shape of a crate.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrateFile {
    name: Option<String>,
    display_item: Option<PluginItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_item: Option<PluginItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    items: Vec<PluginItem>,
}

impl CrateFile {
    fn from_crate(krate: &Crate) -> Self {
        Self {
            name: Some(krate.name().to_string()),
            display_item: Some(krate.display_item()),
            key_item: krate.key_item(),
            items: krate.items_ref().to_vec(),
        }
    }

    fn into_crate(self, path: &Path) -> Result<Crate, StorageError> {
        let name = self.name.ok_or_else(|| StorageError::MissingField {
            path: path.to_path_buf(),
            field: "name",
        })?;
        if !is_valid_name(&name) {
            return Err(StorageError::InvalidName {
                path: path.to_path_buf(),
                name,
            });
        }
        if path.file_stem().and_then(|s| s.to_str()) != Some(name.to_lowercase().as_str()) {
            return Err(StorageError::NameMismatch {
                path: path.to_path_buf(),
                name,
            });
        }
        let display_item = self.display_item.ok_or_else(|| StorageError::MissingField {
            path: path.to_path_buf(),
            field: "displayItem",
        })?;
        let mut krate = Crate::new(name, display_item);
        krate.set_key_item(self.key_item);
        krate.set_items(self.items);
        Ok(krate)
    }
}

// ─── CrateStore ─────────────────────────────────────────────────────────────

/// Directory of crate files.
#[derive(Debug, Clone)]
pub struct CrateStore {
    dir: PathBuf,
}

impl CrateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the backing directory if needed.
    pub fn ensure_dir(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", name.to_lowercase()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Write a full snapshot of the crate, replacing any previous file.
    pub fn save(&self, krate: &Crate) -> Result<(), StorageError> {
        let path = self.path_for(krate.name());
        let json = serde_json::to_string_pretty(&CrateFile::from_crate(krate)).map_err(
            |source| StorageError::Json {
                path: path.clone(),
                source,
            },
        )?;
        std::fs::write(&path, json).map_err(|source| StorageError::Io { path, source })
    }

    pub fn load(&self, path: &Path) -> Result<Crate, StorageError> {
        let data = std::fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CrateFile = serde_json::from_str(&data).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        file.into_crate(path)
    }

    /// Load every `*.json` file in the directory. Bad files are logged and skipped.
    pub fn load_all(&self) -> Vec<Crate> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list crates in {}: {e}", self.dir.display());
                return Vec::new();
            }
        };

        let mut crates = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match self.load(&path) {
                Ok(krate) => {
                    debug!("Loaded {krate} from {}", path.display());
                    crates.push(krate);
                }
                Err(e) => warn!("Skipping crate file: {e}"),
            }
        }
        crates
    }

    /// Remove the crate's file. A file that is already gone is not an error.
    pub fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}
