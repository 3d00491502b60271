// Named-slot persistent storage
// One slot holds one serialized blob, like a browser key/value store

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Storage failures. Callers treat these as "no stored value".
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access slot '{slot}': {source}")]
    Io {
        slot: String,
        #[source]
        source: io::Error,
    },

    #[error("Slot '{slot}' holds malformed content: {source}")]
    Malformed {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize value for slot '{slot}': {source}")]
    Serialize {
        slot: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value store addressed by slot name
pub trait SlotStore: Send + Sync {
    /// Read the raw content of a slot, `None` when the slot is empty
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Replace the content of a slot
    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a slot. Removing an empty slot is not an error.
    fn remove(&self, slot: &str) -> Result<(), StorageError>;
}

/// Slot store backed by one JSON file per slot
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    /// Get storage directory path (~/.posture-sentinel/)
    pub fn default_dir() -> anyhow::Result<PathBuf> {
        crate::config::Settings::config_dir()
    }

    /// Open a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }

    fn io_error(slot: &str, source: io::Error) -> StorageError {
        StorageError::Io {
            slot: slot.to_string(),
            source,
        }
    }
}

impl SlotStore for FileSlotStore {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(slot, e)),
        }
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(slot, e))?;
        fs::write(self.slot_path(slot), value).map_err(|e| Self::io_error(slot, e))?;

        tracing::debug!("Wrote slot {} in {:?}", slot, self.dir);
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.slot_path(slot)) {
            Ok(()) => {
                tracing::debug!("Removed slot {}", slot);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(slot, e)),
        }
    }
}

/// In-process slot store, nothing survives the process
#[derive(Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn read(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(slot).cloned())
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.remove(slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_slot_reads_as_none() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FileSlotStore::new(dir.path());

        assert!(store.read("postureConfig")?.is_none());
        Ok(())
    }

    #[test]
    fn test_write_then_read_slot() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FileSlotStore::new(dir.path().join("nested"));

        store.write("postureConfig", "{\"a\":1}")?;

        assert_eq!(store.read("postureConfig")?.as_deref(), Some("{\"a\":1}"));
        assert!(dir.path().join("nested").join("postureConfig.json").exists());
        Ok(())
    }

    #[test]
    fn test_remove_slot_is_idempotent() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FileSlotStore::new(dir.path());

        store.write("postureConfig", "{}")?;
        store.remove("postureConfig")?;
        store.remove("postureConfig")?;

        assert!(store.read("postureConfig")?.is_none());
        Ok(())
    }

    #[test]
    fn test_memory_store() -> anyhow::Result<()> {
        let store = MemorySlotStore::new();

        store.write("slot", "value")?;
        assert_eq!(store.read("slot")?.as_deref(), Some("value"));

        store.remove("slot")?;
        assert!(store.read("slot")?.is_none());
        Ok(())
    }
}
