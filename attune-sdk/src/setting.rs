use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use notifier::Notifier;
use setting_protocol::{
    SetSettingResult, SettingEventMetadata, SettingEventSender, SettingNotification,
    SettingProtocol,
};
use setting_storage::SettingStorage;

use crate::error::Result;

/// Types usable as live setting values.
///
/// Blanket-implemented; any serde-capable, comparable, thread-safe type
/// qualifies. Values cross the persistence and event boundaries as JSON.
pub trait SettingValue:
    Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static
{
}

impl<T> SettingValue for T where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static
{
}

/// Observes one typed setting.
///
/// Callbacks run on the setting's worker thread and carry the value in
/// effect at the moment of the notification; long-running work belongs
/// elsewhere.
pub trait SettingObserver<T>: Send + Sync {
    fn on_setting_notification(&self, value: &T, notification: SettingNotification);
}

struct Shared<T: SettingValue> {
    value: RwLock<T>,
    observers: Notifier<dyn SettingObserver<T>>,
}

/// A typed device setting synchronized with its remote counterpart.
///
/// Wraps a [`SettingProtocol`] with a live in-memory value and typed
/// observer fan-out. The value is applied and reverted by the handle
/// itself; callers only ever deal in `T`.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use attune_sdk::{Setting, SettingEventMetadata};
/// use attune_sdk::storage::MemorySettingStorage;
///
/// let setting: Setting<bool> = Setting::create(
///     false,
///     SettingEventMetadata::new("DoNotDisturb", "SetDoNotDisturb"),
///     event_sender,
///     Arc::new(MemorySettingStorage::new()),
/// )?;
///
/// setting.restore();
/// setting.set_local(true);
/// ```
pub struct Setting<T: SettingValue> {
    shared: Arc<Shared<T>>,
    protocol: SettingProtocol,
}

impl<T: SettingValue> Setting<T> {
    /// Create a setting handle holding `default_value` until a change or a
    /// [`Setting::restore`] replaces it.
    pub fn create(
        default_value: T,
        metadata: SettingEventMetadata,
        event_sender: Arc<dyn SettingEventSender>,
        storage: Arc<dyn SettingStorage>,
    ) -> Result<Self> {
        let protocol = SettingProtocol::new(metadata, event_sender, storage)?;
        Ok(Self {
            shared: Arc::new(Shared {
                value: RwLock::new(default_value),
                observers: Notifier::new(),
            }),
            protocol,
        })
    }

    /// The value currently in effect.
    pub fn get(&self) -> T {
        self.shared.value.read().clone()
    }

    /// Storage key backing this setting.
    pub fn key(&self) -> &str {
        self.protocol.key()
    }

    pub fn add_observer(&self, observer: Arc<dyn SettingObserver<T>>) {
        self.shared.observers.add_observer(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn SettingObserver<T>>) {
        self.shared.observers.remove_observer(observer);
    }

    /// Request a device-originated change to `new_value`.
    ///
    /// Never blocks; [`SetSettingResult::Enqueued`] means the change will
    /// run asynchronously and observers will hear about its outcome.
    pub fn set_local(&self, new_value: T) -> SetSettingResult {
        let (serialized, previous, restored) = match self.prepare_change(&new_value) {
            Some(prepared) => prepared,
            None => return SetSettingResult::InternalError,
        };

        let apply = {
            let shared = Arc::clone(&self.shared);
            move || {
                *shared.value.write() = new_value;
                (true, serialized)
            }
        };
        let revert = {
            let shared = Arc::clone(&self.shared);
            move || {
                *shared.value.write() = previous;
                restored
            }
        };
        self.protocol.local_change(apply, revert, self.notify_fn())
    }

    /// Apply a cloud-originated change to `new_value`.
    ///
    /// Blocks only until the intent is durably staged; `false` means the
    /// change was rejected before any state was touched.
    pub fn set_remote(&self, new_value: T) -> bool {
        let (serialized, previous, restored) = match self.prepare_change(&new_value) {
            Some(prepared) => prepared,
            None => return false,
        };

        let apply = {
            let shared = Arc::clone(&self.shared);
            move || {
                *shared.value.write() = new_value;
                (true, serialized)
            }
        };
        let revert = {
            let shared = Arc::clone(&self.shared);
            move || {
                *shared.value.write() = previous;
                restored
            }
        };
        self.protocol.avs_change(apply, revert, self.notify_fn())
    }

    /// Reconcile with the persisted record at startup.
    ///
    /// A stored value replaces the default; an interrupted prior change is
    /// replayed to completion, observers included. A record that fails to
    /// deserialize is logged and ignored, keeping the current value.
    pub fn restore(&self) -> bool {
        let shared = Arc::clone(&self.shared);
        let apply = move |stored: Option<&str>| {
            if let Some(raw) = stored {
                match serde_json::from_str::<T>(raw) {
                    Ok(value) => {
                        *shared.value.write() = value;
                        return (true, raw.to_string());
                    }
                    Err(error) => {
                        tracing::warn!(%error, "stored value unreadable, keeping current value");
                    }
                }
            }
            let current = shared.value.read().clone();
            match serde_json::to_string(&current) {
                Ok(serialized) => (true, serialized),
                Err(error) => {
                    tracing::error!(%error, "cannot serialize current value");
                    (false, String::new())
                }
            }
        };
        self.protocol.restore_value(apply, self.notify_fn())
    }

    /// Delete the persisted record; the in-memory value is untouched.
    pub fn clear(&self) -> bool {
        self.protocol.clear_data()
    }

    /// Serialize both sides of a change up front, so the async path never
    /// has to fail on serialization.
    fn prepare_change(&self, new_value: &T) -> Option<(String, T, String)> {
        let serialized = match serde_json::to_string(new_value) {
            Ok(serialized) => serialized,
            Err(error) => {
                tracing::error!(key = %self.protocol.key(), %error, "cannot serialize new value");
                return None;
            }
        };
        let previous = self.shared.value.read().clone();
        let restored = match serde_json::to_string(&previous) {
            Ok(restored) => restored,
            Err(error) => {
                tracing::error!(key = %self.protocol.key(), %error, "cannot serialize current value");
                return None;
            }
        };
        Some((serialized, previous, restored))
    }

    fn notify_fn(&self) -> impl Fn(SettingNotification) + Send + 'static {
        let shared = Arc::clone(&self.shared);
        move |notification| {
            let current = shared.value.read().clone();
            shared
                .observers
                .notify_observers(|observer| observer.on_setting_notification(&current, notification));
        }
    }
}

impl<T: SettingValue> std::fmt::Debug for Setting<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Setting")
            .field("key", &self.protocol.key())
            .finish()
    }
}
