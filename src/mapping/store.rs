//! Persistent header mapping memory.
//!
//! The store is a flat JSON object `raw header → canonical column`, where an
//! empty target records a header the operator chose to leave unmapped. It is
//! rewritten in full (sorted, pretty-printed) after every change.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};

/// Default file name of the mapping store.
pub const DEFAULT_STORE_FILE: &str = "header_mappings.json";

/// Header → canonical column mappings, optionally backed by a file.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
    writes: usize,
}

impl MappingStore {
    /// Open a store file; a missing file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                Error::MappingStore(format!("Failed to read {}: {}", path.display(), e))
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| {
                    Error::MappingStore(format!("Failed to parse {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Loaded {} header mappings from {}", entries.len(), path.display());

        Ok(Self {
            path: Some(path),
            entries,
            writes: 0,
        })
    }

    /// Create a store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create an in-memory store with initial entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Canonical target of a header; `Some("")` means explicitly unmapped.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.entries.get(header).map(String::as_str)
    }

    /// Check whether a header has a decision recorded.
    pub fn contains(&self, header: &str) -> bool {
        self.entries.contains_key(header)
    }

    /// All entries, sorted by header.
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of times the store was persisted since it was opened.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Record a mapping and persist it. An unchanged entry is not rewritten.
    pub fn assign(&mut self, header: &str, target: &str) -> Result<()> {
        if self.get(header) == Some(target) {
            return Ok(());
        }
        self.entries.insert(header.to_string(), target.to_string());
        if target.is_empty() {
            info!("Header '{}' left unmapped", header);
        } else {
            info!("Mapped header '{}' -> '{}'", header, target);
        }
        self.save()
    }

    /// Remove a mapping and persist the change.
    pub fn remove(&mut self, header: &str) -> Result<Option<String>> {
        let removed = self.entries.remove(header);
        if removed.is_some() {
            info!("Removed mapping for header '{}'", header);
            self.save()?;
        }
        Ok(removed)
    }

    /// Rewrite the backing file: sibling temp file, then rename.
    pub fn save(&mut self) -> Result<()> {
        self.writes += 1;
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::MappingStore(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let mut json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| Error::MappingStore(format!("Failed to serialize mappings: {}", e)))?;
        json.push('\n');

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);
        fs::write(&tmp, json)
            .map_err(|e| Error::MappingStore(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, path).map_err(|e| {
            Error::MappingStore(format!("Failed to replace {}: {}", path.display(), e))
        })?;
        debug!("Saved {} header mappings to {}", self.entries.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = MappingStore::open(dir.path().join("none.json")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = MappingStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::MappingStore(_)));
    }

    #[test]
    fn test_assign_persists_sorted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        let mut store = MappingStore::open(&path).unwrap();
        store.assign("Name", "Chemical Name").unwrap();
        store.assign("CAS Number", "CAS #").unwrap();
        store.assign("Notes", "").unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let cas = written.find("CAS Number").unwrap();
        let name = written.find("\"Name\"").unwrap();
        assert!(cas < name);
        assert!(!dir.path().join("header_mappings.json.tmp").exists());

        let reopened = MappingStore::open(&path).unwrap();
        assert_eq!(reopened.get("CAS Number"), Some("CAS #"));
        assert_eq!(reopened.get("Notes"), Some(""));
        assert_eq!(reopened.len(), 3);
    }

    #[test]
    fn test_unchanged_assign_does_not_write() {
        let mut store = MappingStore::in_memory();
        store.assign("A", "B").unwrap();
        store.assign("A", "B").unwrap();
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store = MappingStore::with_entries([("A", "B")]);
        assert_eq!(store.remove("A").unwrap().as_deref(), Some("B"));
        assert_eq!(store.remove("A").unwrap(), None);
        assert_eq!(store.write_count(), 1);
    }
}
