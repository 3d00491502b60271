use std::sync::Arc;

use super::posture::PostureConfig;
use crate::models::ServiceDefaults;
use crate::storage::{SlotStore, StorageError};

/// Persists the posture thresholds in a single storage slot
#[derive(Clone)]
pub struct ConfigStore {
    store: Arc<dyn SlotStore>,
    slot: String,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn SlotStore>, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
        }
    }

    /// Read the stored config, reporting read and parse failures
    pub fn try_load(&self) -> Result<Option<PostureConfig>, StorageError> {
        let Some(contents) = self.store.read(&self.slot)? else {
            return Ok(None);
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StorageError::Malformed {
                slot: self.slot.clone(),
                source,
            })
    }

    /// Read the stored config; any failure counts as "nothing stored"
    pub fn load(&self) -> Option<PostureConfig> {
        match self.try_load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Failed to load stored config: {}", e);
                None
            }
        }
    }

    /// Persist a config. The caller keeps its in-memory copy on failure.
    pub fn save(&self, config: &PostureConfig) -> Result<(), StorageError> {
        let contents =
            serde_json::to_string(config).map_err(|source| StorageError::Serialize {
                slot: self.slot.clone(),
                source,
            })?;

        self.store.write(&self.slot, &contents)?;

        tracing::info!("Saved posture config to slot {}", self.slot);
        Ok(())
    }

    /// Forget the stored config and return one built from service defaults
    pub fn reset(&self, defaults: &ServiceDefaults) -> PostureConfig {
        if let Err(e) = self.store.remove(&self.slot) {
            tracing::warn!("Failed to clear stored config: {}", e);
        }

        PostureConfig::from_defaults(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ALERT_INTERVAL_MS;
    use crate::storage::MemorySlotStore;

    fn create_test_store() -> (Arc<MemorySlotStore>, ConfigStore) {
        let slots = Arc::new(MemorySlotStore::new());
        let store = ConfigStore::new(slots.clone(), "postureConfig");
        (slots, store)
    }

    fn sample() -> PostureConfig {
        PostureConfig {
            right_min_angle: -40.0,
            right_max_angle: -3.0,
            left_min_angle: 3.0,
            left_max_angle: 40.0,
            alert_interval_ms: 5000,
        }
    }

    #[test]
    fn test_load_empty_slot() {
        let (_, store) = create_test_store();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load() -> anyhow::Result<()> {
        let (_, store) = create_test_store();

        store.save(&sample())?;

        assert_eq!(store.load(), Some(sample()));
        Ok(())
    }

    #[test]
    fn test_malformed_slot_degrades_to_none() -> anyhow::Result<()> {
        let (slots, store) = create_test_store();
        slots.write("postureConfig", "{not json")?;

        assert!(store.load().is_none());
        assert!(matches!(
            store.try_load(),
            Err(StorageError::Malformed { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_reads_browser_style_blob() -> anyhow::Result<()> {
        let (slots, store) = create_test_store();
        slots.write(
            "postureConfig",
            r#"{"rightMinAngle":-50,"rightMaxAngle":0,"leftMinAngle":0,"leftMaxAngle":50,"alertInterval":8000}"#,
        )?;

        let loaded = store.load().expect("stored config");
        assert_eq!(loaded.right_min_angle, -50.0);
        assert_eq!(loaded.alert_interval_ms, 8000);
        Ok(())
    }

    #[test]
    fn test_reset_clears_slot() -> anyhow::Result<()> {
        let (slots, store) = create_test_store();
        store.save(&sample())?;

        let config = store.reset(&ServiceDefaults::fallback());

        assert!(slots.read("postureConfig")?.is_none());
        assert_eq!(config.right_min_angle, -60.0);
        assert_eq!(config.alert_interval_ms, DEFAULT_ALERT_INTERVAL_MS);
        Ok(())
    }
}
