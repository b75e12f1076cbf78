use async_trait::async_trait;

/// Sends setting-change notifications to the remote counterpart.
///
/// Implemented by the connection layer that owns the cloud session. The
/// protocol awaits each send to completion on its own worker thread, never
/// on the caller's thread, so implementations may take a full network round
/// trip.
///
/// A `false` return means the remote did not accept the event. The protocol
/// logs such failures but does not retry them; re-synchronization is driven
/// by a higher-level reconnection/report mechanism.
#[async_trait]
pub trait SettingEventSender: Send + Sync {
    /// Notify the remote counterpart that the device changed the value.
    async fn send_changed_event(&self, value: &str) -> bool;

    /// Report the value now in effect after a cloud-originated change.
    async fn send_report_event(&self, value: &str) -> bool;
}
