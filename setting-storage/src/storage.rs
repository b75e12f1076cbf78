use crate::error::Result;
use crate::status::SettingStatus;

/// Durable, component-scoped key/value persistence for setting records.
///
/// Each record pairs a serialized value with a [`SettingStatus`] tag. The
/// setting protocol owns exclusive write access to its key; implementations
/// only need to make individual operations atomic, not coordinate writers.
///
/// All operations are synchronous from the caller's perspective and may
/// block on backing I/O.
pub trait SettingStorage: Send + Sync {
    /// Store (insert or replace) the record for `key`.
    fn store_setting(&self, key: &str, value: &str, status: SettingStatus) -> Result<()>;

    /// Load the record for `key`.
    ///
    /// An absent key is not an error; it loads as
    /// `(SettingStatus::NotAvailable, "")`.
    fn load_setting(&self, key: &str) -> Result<(SettingStatus, String)>;

    /// Replace only the status of an existing record, preserving its value.
    ///
    /// Updating an absent key is a successful no-op, mirroring an SQL
    /// `UPDATE` that matches no rows.
    fn update_setting_status(&self, key: &str, status: SettingStatus) -> Result<()>;

    /// Delete the record for `key`. Deleting an absent key succeeds.
    fn delete_setting(&self, key: &str) -> Result<()>;
}
