//! Generic Observer Broadcast Library
//!
//! A thread-safe, generic observer registry underpinning the pub/sub
//! relationships in the Attune SDK.
//!
//! # Features
//!
//! - **Strong and weak registration**: observers are held by `Arc` or `Weak`
//!   reference, chosen at registration time
//! - **Idempotent registration**: adding the same observer twice is a no-op
//! - **Ordered delivery**: forward (insertion) and reverse-order passes
//! - **Reentrancy-safe**: callbacks may add/remove observers or trigger
//!   another pass on the same instance
//! - **Late-registration detection**: reverse passes report whether an
//!   observer was added mid-pass
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use notifier::Notifier;
//!
//! trait ConnectionObserver: Send + Sync {
//!     fn on_connected(&self);
//! }
//!
//! struct Logger;
//! impl ConnectionObserver for Logger {
//!     fn on_connected(&self) {}
//! }
//!
//! let notifier: Notifier<dyn ConnectionObserver> = Notifier::new();
//! let logger: Arc<dyn ConnectionObserver> = Arc::new(Logger);
//!
//! // Weak registration: the notifier never keeps the observer alive.
//! notifier.add_weak_observer(Arc::downgrade(&logger));
//! notifier.notify_observers(|o| o.on_connected());
//! ```

mod notifier;

pub use crate::notifier::Notifier;
