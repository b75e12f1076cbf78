use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::status::SettingStatus;
use crate::storage::SettingStorage;

/// In-memory [`SettingStorage`] implementation.
///
/// Backs tests and integrations that do not need durability. Clones share
/// the same underlying map.
#[derive(Clone, Default)]
pub struct MemorySettingStorage {
    records: std::sync::Arc<RwLock<HashMap<String, (SettingStatus, String)>>>,
}

impl MemorySettingStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }
}

impl SettingStorage for MemorySettingStorage {
    fn store_setting(&self, key: &str, value: &str, status: SettingStatus) -> Result<()> {
        tracing::debug!(key, %status, "storing setting record");
        self.records
            .write()
            .insert(key.to_string(), (status, value.to_string()));
        Ok(())
    }

    fn load_setting(&self, key: &str) -> Result<(SettingStatus, String)> {
        Ok(self
            .records
            .read()
            .get(key)
            .cloned()
            .unwrap_or((SettingStatus::NotAvailable, String::new())))
    }

    fn update_setting_status(&self, key: &str, status: SettingStatus) -> Result<()> {
        tracing::debug!(key, %status, "updating setting status");
        if let Some(record) = self.records.write().get_mut(key) {
            record.0 = status;
        }
        Ok(())
    }

    fn delete_setting(&self, key: &str) -> Result<()> {
        tracing::debug!(key, "deleting setting record");
        self.records.write().remove(key);
        Ok(())
    }
}

impl std::fmt::Debug for MemorySettingStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySettingStorage")
            .field("record_count", &self.record_count())
            .finish()
    }
}
