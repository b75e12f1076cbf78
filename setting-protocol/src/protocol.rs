use std::sync::{mpsc, Arc};

use setting_storage::{SettingStatus, SettingStorage};

use crate::executor::SerialExecutor;
use crate::sender::SettingEventSender;
use crate::types::{Result, SetSettingResult, SettingEventMetadata, SettingNotification};

/// Synchronization protocol for one named setting.
///
/// Coordinates apply/revert callbacks supplied by the setting owner,
/// persistence through a [`SettingStorage`], and change/report events to the
/// remote counterpart, guaranteeing that the persisted status is never left
/// in an `*InProgress` state once a change completes (normally) and that an
/// interrupted change is replayed by [`SettingProtocol::restore_value`] at
/// the next startup.
///
/// One instance owns exclusive write access to its storage key and runs all
/// mutation work on its own serial task queue; independent settings run
/// their protocols concurrently.
pub struct SettingProtocol {
    key: String,
    event_sender: Arc<dyn SettingEventSender>,
    storage: Arc<dyn SettingStorage>,
    executor: SerialExecutor,
}

impl SettingProtocol {
    /// Create a protocol instance for the setting identified by `metadata`.
    pub fn new(
        metadata: SettingEventMetadata,
        event_sender: Arc<dyn SettingEventSender>,
        storage: Arc<dyn SettingStorage>,
    ) -> Result<Self> {
        let key = metadata.key();
        let executor = SerialExecutor::new(key.clone())?;
        Ok(Self {
            key,
            event_sender,
            storage,
            executor,
        })
    }

    /// Storage key this protocol owns.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run a device-originated change.
    ///
    /// Returns [`SetSettingResult::Enqueued`] immediately; the caller never
    /// blocks on persistence or remote I/O. Asynchronously: apply the value,
    /// stage it as `LocalChangeInProgress`, send the "changed" event (a send
    /// failure is logged, not retried here), then drive the persisted status
    /// to `Synchronized`. If the staging write fails, `revert_change`
    /// restores the in-memory value before the failure notification goes
    /// out. If `apply_change` itself fails, nothing is persisted at all.
    pub fn local_change<A, R, N>(
        &self,
        apply_change: A,
        revert_change: R,
        notify: N,
    ) -> SetSettingResult
    where
        A: FnOnce() -> (bool, String) + Send + 'static,
        R: FnOnce() -> String + Send + 'static,
        N: Fn(SettingNotification) + Send + 'static,
    {
        tracing::debug!(key = %self.key, "local_change");

        let key = self.key.clone();
        let storage = Arc::clone(&self.storage);
        let sender = Arc::clone(&self.event_sender);
        let submitted = self.executor.submit(move |rt| {
            notify(SettingNotification::LocalChangeInProgress);

            let (ok, value) = apply_change();
            if !ok {
                tracing::error!(key = %key, "local change failed: cannot apply change");
                notify(SettingNotification::LocalChangeFailed);
                return;
            }

            if let Err(error) =
                storage.store_setting(&key, &value, SettingStatus::LocalChangeInProgress)
            {
                tracing::error!(key = %key, %error, "local change failed: cannot update storage");
                revert_change();
                notify(SettingNotification::LocalChangeFailed);
                return;
            }

            notify(SettingNotification::LocalChange);

            if !rt.block_on(sender.send_changed_event(&value)) {
                tracing::warn!(key = %key, "changed event not accepted; awaiting higher-level re-sync");
            }

            if let Err(error) = storage.store_setting(&key, &value, SettingStatus::Synchronized) {
                tracing::error!(key = %key, %error, "local change failed: cannot update status");
            }
        });

        if submitted {
            SetSettingResult::Enqueued
        } else {
            SetSettingResult::InternalError
        }
    }

    /// Run a cloud-originated change.
    ///
    /// Blocks the caller only until the intent-to-change is durably staged
    /// (`AvsChangeInProgress`, value preserved); returns `false` if that
    /// write fails, before any apply attempt. The apply/notify/report
    /// sequence then runs asynchronously; a "report" event carrying
    /// whichever value ended up in effect goes out for success and failure
    /// alike, and the persisted status is driven to `Synchronized`.
    pub fn avs_change<A, R, N>(&self, apply_change: A, revert_change: R, notify: N) -> bool
    where
        A: FnOnce() -> (bool, String) + Send + 'static,
        R: FnOnce() -> String + Send + 'static,
        N: Fn(SettingNotification) + Send + 'static,
    {
        tracing::debug!(key = %self.key, "avs_change");

        let key = self.key.clone();
        let storage = Arc::clone(&self.storage);
        let sender = Arc::clone(&self.event_sender);
        let (intent_tx, intent_rx) = mpsc::channel();
        let submitted = self.executor.submit(move |rt| {
            // Stage the request before touching the live value, so a crash
            // here replays the change on the next startup.
            if let Err(error) =
                storage.update_setting_status(&key, SettingStatus::AvsChangeInProgress)
            {
                tracing::error!(key = %key, %error, "avs change failed: cannot stage intent");
                let _ = intent_tx.send(false);
                return;
            }
            let _ = intent_tx.send(true);

            notify(SettingNotification::AvsChangeInProgress);

            let (ok, mut value) = apply_change();
            if !ok {
                tracing::error!(key = %key, "avs change failed: cannot apply change");
                notify(SettingNotification::AvsChangeFailed);
            } else if let Err(error) =
                storage.store_setting(&key, &value, SettingStatus::AvsChangeInProgress)
            {
                tracing::error!(key = %key, %error, "avs change failed: cannot update storage");
                notify(SettingNotification::AvsChangeFailed);
                value = revert_change();
            } else {
                notify(SettingNotification::AvsChange);
            }

            // The report goes out for failure and success alike, carrying
            // the value now in effect.
            if !rt.block_on(sender.send_report_event(&value)) {
                tracing::warn!(key = %key, "report event not accepted; awaiting higher-level re-sync");
            }

            if let Err(error) = storage.update_setting_status(&key, SettingStatus::Synchronized) {
                tracing::error!(key = %key, %error, "avs change failed: cannot update status");
            }
        });

        if !submitted {
            return false;
        }
        intent_rx.recv().unwrap_or(false)
    }

    /// Reconcile a possibly interrupted prior change at startup.
    ///
    /// Loads the persisted record and replays it: an interrupted local
    /// change (or a missing record) re-runs through [`Self::local_change`]
    /// semantics, an interrupted cloud change through [`Self::avs_change`]
    /// semantics. A `Synchronized` record applies the stored value directly
    /// with no persistence writes and no notifications.
    ///
    /// `apply_change` receives the stored value, or `None` when no value is
    /// available (missing record, or the synthesized revert path).
    pub fn restore_value<A, N>(&self, apply_change: A, notify: N) -> bool
    where
        A: Fn(Option<&str>) -> (bool, String) + Send + Sync + 'static,
        N: Fn(SettingNotification) + Send + 'static,
    {
        tracing::debug!(key = %self.key, "restore_value");

        let (status, value) = match self.storage.load_setting(&self.key) {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(key = %self.key, %error, "restore failed: cannot load setting");
                return false;
            }
        };

        let apply = Arc::new(apply_change);
        match status {
            SettingStatus::NotAvailable | SettingStatus::LocalChangeInProgress => {
                let stored = (status != SettingStatus::NotAvailable).then_some(value);
                let apply_stored = {
                    let apply = Arc::clone(&apply);
                    move || apply(stored.as_deref())
                };
                let revert = move || apply(None).1;
                self.local_change(apply_stored, revert, notify) == SetSettingResult::Enqueued
            }
            SettingStatus::AvsChangeInProgress => {
                let apply_stored = {
                    let apply = Arc::clone(&apply);
                    move || apply(Some(&value))
                };
                let revert = move || apply(None).1;
                self.avs_change(apply_stored, revert, notify)
            }
            SettingStatus::Synchronized => apply(Some(&value)).0,
        }
    }

    /// Delete this setting's persisted record. Idempotent; used on logout
    /// and factory reset.
    pub fn clear_data(&self) -> bool {
        tracing::debug!(key = %self.key, "clear_data");
        match self.storage.delete_setting(&self.key) {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(key = %self.key, %error, "clear_data failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for SettingProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingProtocol")
            .field("key", &self.key)
            .finish()
    }
}
