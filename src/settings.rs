//! Persisted output volumes
//!
//! Volumes are stored per output name through a small key-value trait, so the
//! manager does not care whether they live in memory or on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key-value store for output volumes.
pub trait VolumeStore: Send {
    /// Stored value for `key`.
    fn get(&self, key: &str) -> Option<f32>;

    /// Store `value` under `key`.
    fn set(&mut self, key: &str, value: f32) -> crate::Result<()>;
}

/// Volatile store, used by default and in tests.
#[derive(Debug, Default)]
pub struct MemoryVolumeStore {
    values: BTreeMap<String, f32>,
}

impl MemoryVolumeStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VolumeStore for MemoryVolumeStore {
    fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: f32) -> crate::Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a JSON object file, rewritten on every change.
#[derive(Debug)]
pub struct JsonVolumeStore {
    path: PathBuf,
    values: BTreeMap<String, f32>,
}

impl JsonVolumeStore {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text).map_err(|e| {
                crate::AudioPoolError::settings(format!("{}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> crate::Result<()> {
        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|e| crate::AudioPoolError::settings(e.to_string()))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl VolumeStore for JsonVolumeStore {
    fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: f32) -> crate::Result<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryVolumeStore::new();
        assert_eq!(store.get("Music"), None);
        store.set("Music", 0.3).unwrap();
        assert_eq!(store.get("Music"), Some(0.3));
    }

    #[test]
    fn json_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volumes.json");

        let mut store = JsonVolumeStore::open(&path).unwrap();
        store.set("SFX", 0.25).unwrap();
        drop(store);

        let reopened = JsonVolumeStore::open(&path).unwrap();
        assert_eq!(reopened.get("SFX"), Some(0.25));
    }

    #[test]
    fn json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volumes.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(JsonVolumeStore::open(&path).is_err());
    }
}
