//! Attune Device SDK
//!
//! Typed, observable device settings kept in sync with a remote
//! counterpart. A [`Setting<T>`] owns the live value, persists it through
//! a pluggable store, and exchanges change/report events with the remote
//! side through a [`SettingEventSender`] supplied by the integration.
//!
//! All public calls are synchronous; each setting runs its own worker
//! thread for persistence and event I/O, so device- and cloud-originated
//! changes on one setting serialize while independent settings run
//! concurrently.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use attune_sdk::{Setting, SettingEventMetadata};
//! use attune_sdk::storage::MemorySettingStorage;
//!
//! let setting: Setting<bool> = Setting::create(
//!     false,
//!     SettingEventMetadata::new("DoNotDisturb", "SetDoNotDisturb"),
//!     event_sender,
//!     Arc::new(MemorySettingStorage::new()),
//! )?;
//!
//! setting.restore();          // reconcile with the persisted record
//! setting.set_local(true);    // device-originated change, non-blocking
//! assert!(setting.get());
//! ```

mod error;
mod setting;

pub use crate::error::{Result, SdkError};
pub use crate::setting::{Setting, SettingObserver, SettingValue};

pub use setting_protocol::{
    SetSettingResult, SettingEventMetadata, SettingEventSender, SettingNotification,
};

/// Persistence backends for settings.
pub mod storage {
    pub use setting_storage::{
        MemorySettingStorage, SettingStatus, SettingStorage, StorageError,
    };
}

/// Observer broadcast primitive, reusable outside settings.
pub use notifier::Notifier;
