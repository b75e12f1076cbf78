//! Notification Audio Rendering
//!
//! A state machine coordinating a two-tier notification audio render: the
//! preferred (remote) asset is attempted first, with fallback to a default
//! built-in asset if the preferred one fails to load or start.
//!
//! One session runs at a time; concurrent render requests are refused
//! rather than queued. Session completion is broadcast to observers through
//! a [`notifier::Notifier`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use notification_renderer::{AudioFactory, NotificationRenderer};
//!
//! let renderer = NotificationRenderer::new(player);
//! let factory: AudioFactory = Arc::new(default_chime);
//!
//! if renderer.render_notification(factory, "https://assets/chime.mp3") {
//!     // ... playback callbacks drive the session to completion
//! }
//! ```

mod player;
mod renderer;

pub use player::{AudioFactory, AudioStream, MediaPlayer, MediaType, RendererObserver, SourceId};
pub use renderer::{NotificationRenderer, RendererState};
