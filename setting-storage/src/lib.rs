//! Setting Persistence Contract
//!
//! Defines the durable key/value contract consumed by the setting
//! synchronization protocol, plus an in-memory implementation for tests and
//! non-durable integrations.
//!
//! Each persisted record pairs a serialized setting value with a
//! [`SettingStatus`] tag describing where the value sits in the
//! local/remote synchronization lifecycle. A status left in one of the
//! `*InProgress` states marks an interrupted change and drives recovery at
//! the next startup.
//!
//! # Quick Start
//!
//! ```rust
//! use setting_storage::{MemorySettingStorage, SettingStatus, SettingStorage};
//!
//! let storage = MemorySettingStorage::new();
//! storage
//!     .store_setting("DoNotDisturb::SetDoNotDisturb", "true", SettingStatus::Synchronized)
//!     .unwrap();
//!
//! let (status, value) = storage.load_setting("DoNotDisturb::SetDoNotDisturb").unwrap();
//! assert_eq!(status, SettingStatus::Synchronized);
//! assert_eq!(value, "true");
//! ```

mod error;
mod memory;
mod status;
mod storage;

pub use error::{Result, StorageError};
pub use memory::MemorySettingStorage;
pub use status::SettingStatus;
pub use storage::SettingStorage;
