use serde::{Deserialize, Serialize};

/// Synchronization status tag persisted alongside a setting value.
///
/// At any quiescent point a durably committed record carries
/// `NotAvailable` or `Synchronized`; the `*InProgress` tags are observed
/// only transiently, or after a crash, where they mark which kind of change
/// was interrupted and must be replayed on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettingStatus {
    /// No record exists for this setting
    NotAvailable,
    /// A device-originated change was staged but not yet synchronized
    LocalChangeInProgress,
    /// A cloud-originated change was staged but not yet synchronized
    AvsChangeInProgress,
    /// The persisted value matches the remote counterpart
    Synchronized,
}

impl SettingStatus {
    /// Stable string tag used by storage backends that persist the status
    /// as text.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingStatus::NotAvailable => "NOT_AVAILABLE",
            SettingStatus::LocalChangeInProgress => "LOCAL_CHANGE_IN_PROGRESS",
            SettingStatus::AvsChangeInProgress => "AVS_CHANGE_IN_PROGRESS",
            SettingStatus::Synchronized => "SYNCHRONIZED",
        }
    }

    /// Parse the stable string tag back to a status.
    pub fn from_str_tag(tag: &str) -> Option<Self> {
        match tag {
            "NOT_AVAILABLE" => Some(SettingStatus::NotAvailable),
            "LOCAL_CHANGE_IN_PROGRESS" => Some(SettingStatus::LocalChangeInProgress),
            "AVS_CHANGE_IN_PROGRESS" => Some(SettingStatus::AvsChangeInProgress),
            "SYNCHRONIZED" => Some(SettingStatus::Synchronized),
            _ => None,
        }
    }
}

impl std::fmt::Display for SettingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
