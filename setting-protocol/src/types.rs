use thiserror::Error;

/// Result type for protocol construction
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur while setting up a protocol instance
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The dedicated worker thread or its runtime could not be started
    #[error("Failed to start protocol worker: {0}")]
    Worker(#[from] std::io::Error),
}

/// Identifies a setting by the namespace and name used in its remote events.
///
/// The persisted storage key is derived from both parts, so two settings
/// with the same name in different namespaces never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingEventMetadata {
    pub event_namespace: String,
    pub setting_name: String,
}

impl SettingEventMetadata {
    pub fn new(event_namespace: impl Into<String>, setting_name: impl Into<String>) -> Self {
        Self {
            event_namespace: event_namespace.into(),
            setting_name: setting_name.into(),
        }
    }

    /// Stable storage key for this setting.
    pub fn key(&self) -> String {
        format!("{}::{}", self.event_namespace, self.setting_name)
    }
}

/// Phase notifications delivered to the setting owner while a change runs.
///
/// The `*Failed` variants are the only failure signal on the asynchronous
/// path; there is no separate error channel. Owners must not block
/// significantly inside the notification callback, which runs on the
/// protocol's worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingNotification {
    /// A device-originated change has started
    LocalChangeInProgress,
    /// A device-originated change was applied and persisted
    LocalChange,
    /// A device-originated change could not be applied or persisted
    LocalChangeFailed,
    /// A cloud-originated change has started
    AvsChangeInProgress,
    /// A cloud-originated change was applied and persisted
    AvsChange,
    /// A cloud-originated change could not be applied or persisted
    AvsChangeFailed,
}

/// Synchronous outcome of requesting a local change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetSettingResult {
    /// The change was accepted and will run asynchronously
    Enqueued,
    /// The request was rejected before any asynchronous work began
    InternalError,
}
