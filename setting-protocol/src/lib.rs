//! Setting Synchronization Protocol
//!
//! Orchestrates local-initiated and cloud-initiated changes to a single
//! named setting so that the live in-memory value, the persisted record, and
//! the remote counterpart converge, surviving process restarts and remote
//! send failures.
//!
//! All mutation work for one setting runs on a dedicated single-consumer
//! task queue, which serializes changes per key: there is never more than
//! one change in flight for a given setting. `local_change` never blocks the
//! caller; `avs_change` blocks only until the intent-to-change is durably
//! staged.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use setting_protocol::{SettingEventMetadata, SettingProtocol};
//! use setting_storage::MemorySettingStorage;
//!
//! let metadata = SettingEventMetadata::new("DoNotDisturb", "SetDoNotDisturb");
//! let protocol = SettingProtocol::new(metadata, sender, Arc::new(MemorySettingStorage::new()))?;
//!
//! // A user toggled the setting on the device: apply it, persist it, and
//! // push a "changed" event to the cloud, all off the caller's thread.
//! protocol.local_change(
//!     || (true, "true".to_string()),
//!     || "false".to_string(),
//!     |notification| println!("{notification:?}"),
//! );
//! ```

mod executor;
mod protocol;
mod sender;
mod types;

pub use protocol::SettingProtocol;
pub use sender::SettingEventSender;
pub use types::{
    ProtocolError, Result, SetSettingResult, SettingEventMetadata, SettingNotification,
};
