use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use notifier::Notifier;
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::player::{AudioFactory, MediaPlayer, RendererObserver, SourceId};

/// Rendering session state.
///
/// `Idle` is the quiescent state between sessions; `Notifying` covers the
/// narrow window in which observers are being told the session ended but
/// the machine has not yet returned to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Idle,
    RenderingPreferred,
    RenderingDefault,
    Cancelling,
    Notifying,
}

impl std::fmt::Display for RendererState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RendererState::Idle => "IDLE",
            RendererState::RenderingPreferred => "RENDERING_PREFERRED",
            RendererState::RenderingDefault => "RENDERING_DEFAULT",
            RendererState::Cancelling => "CANCELLING",
            RendererState::Notifying => "NOTIFYING",
        };
        f.write_str(name)
    }
}

/// Per-session mutable state, all behind one mutex.
struct Session {
    state: RendererState,
    source_id: Option<SourceId>,
    audio_factory: Option<AudioFactory>,
    /// Fallback worker spawned by a playback error; joined on drop so the
    /// renderer outlives the thread.
    fallback: Option<JoinHandle<()>>,
}

struct Inner {
    player: Arc<dyn MediaPlayer>,
    session: Mutex<Session>,
    wake: Condvar,
    observers: Notifier<dyn RendererObserver>,
}

/// Renders one notification audio asset at a time against a media player.
///
/// A session first attempts the preferred (remote) asset by URL and falls
/// back to the default asset produced by the session's audio factory if the
/// preferred one fails to start. Exactly one session is active per renderer;
/// [`NotificationRenderer::render_notification`] refuses concurrent calls
/// rather than queueing them.
///
/// Clones share the same state machine.
#[derive(Clone)]
pub struct NotificationRenderer {
    inner: Arc<Inner>,
}

impl NotificationRenderer {
    pub fn new(player: Arc<dyn MediaPlayer>) -> Self {
        Self {
            inner: Arc::new(Inner {
                player,
                session: Mutex::new(Session {
                    state: RendererState::Idle,
                    source_id: None,
                    audio_factory: None,
                    fallback: None,
                }),
                wake: Condvar::new(),
                observers: Notifier::new(),
            }),
        }
    }

    /// Register an observer for the terminal session notification.
    pub fn add_observer(&self, observer: Weak<dyn RendererObserver>) {
        self.inner.observers.add_weak_observer(observer);
    }

    pub fn remove_observer(&self, observer: &Weak<dyn RendererObserver>) {
        self.inner.observers.remove_weak_observer(observer);
    }

    /// Current state; primarily for diagnostics and tests.
    pub fn state(&self) -> RendererState {
        self.inner.session.lock().state
    }

    /// Start rendering a notification.
    ///
    /// Returns `false` if a session is already active (no queueing). There
    /// is a narrow window after a prior session's observers were notified
    /// but before the machine returns to `Idle`; a call landing in that
    /// window waits on a condition variable (no timeout) instead of
    /// needlessly failing.
    ///
    /// The preferred asset at `url` is tried first; if it fails to load or
    /// start, the default asset from `audio_factory` is tried. If both fail
    /// the session aborts back to `Idle`, returns `false`, and no observer
    /// callback fires, since playback never started. The exception is a
    /// cancel racing the failure: the session then ends through the
    /// cancellation path and observers are notified.
    pub fn render_notification(&self, audio_factory: AudioFactory, url: &str) -> bool {
        tracing::debug!(url, "render_notification");
        let inner = &self.inner;
        {
            let mut session = inner.session.lock();
            while session.state == RendererState::Notifying {
                inner.wake.wait(&mut session);
            }
            if !Self::set_state_locked(inner, &mut session, RendererState::RenderingPreferred) {
                return false;
            }
            session.audio_factory = Some(audio_factory);
        }

        // Player calls happen outside the lock; the player may invoke
        // callbacks on this renderer from its own threads.
        if let Some(source_id) = inner.player.set_url_source(url) {
            inner.session.lock().source_id = Some(source_id);
            if inner.player.play(source_id) {
                tracing::debug!(source_id, "rendering preferred asset");
                return true;
            }
        }
        tracing::warn!(url, "preferred asset failed to start; falling back to default");

        if self.set_state(RendererState::RenderingDefault) && self.start_default_asset() {
            return true;
        }

        tracing::error!("default asset failed to start; aborting session");
        let mut session = inner.session.lock();
        if session.state == RendererState::Cancelling {
            // A cancel landed while the preferred asset was failing; end the
            // session through the cancellation path so observers still hear
            // about it.
            drop(session);
            self.rendering_finished();
            return false;
        }
        session.source_id = None;
        session.audio_factory = None;
        Self::set_state_locked(inner, &mut session, RendererState::Idle);
        false
    }

    /// Request cancellation of the in-progress session.
    ///
    /// Only valid while rendering (preferred or default); returns `false`
    /// otherwise. Cancellation is best-effort: if the stop request fails
    /// the machine stays in `Cancelling` and completes via the eventual
    /// terminal playback callback. No bounded timeout is applied.
    pub fn cancel_notification_rendering(&self) -> bool {
        tracing::debug!("cancel_notification_rendering");
        if !self.set_state(RendererState::Cancelling) {
            return false;
        }
        let source_id = self.inner.session.lock().source_id;
        match source_id {
            Some(source_id) if self.inner.player.stop(source_id) => {}
            _ => {
                // Already transitioned; nothing to do but wait for the
                // player's terminal callback.
                tracing::error!("stop request failed; remaining in CANCELLING");
            }
        }
        true
    }

    /// Playback started callback from the media player.
    pub fn on_playback_started(&self, source_id: SourceId) {
        let session = self.inner.session.lock();
        if session.source_id != Some(source_id) {
            tracing::warn!(source_id, "ignoring playback start for stale source");
            return;
        }
        if matches!(
            session.state,
            RendererState::Idle | RendererState::Notifying
        ) {
            tracing::error!(state = %session.state, "unexpected playback start");
        }
    }

    /// Playback stopped callback from the media player.
    pub fn on_playback_stopped(&self, source_id: SourceId) {
        if !self.is_current_source(source_id) {
            tracing::warn!(source_id, "ignoring playback stop for stale source");
            return;
        }
        self.rendering_finished();
    }

    /// Playback finished callback from the media player.
    pub fn on_playback_finished(&self, source_id: SourceId) {
        if !self.is_current_source(source_id) {
            tracing::warn!(source_id, "ignoring playback finish for stale source");
            return;
        }
        self.rendering_finished();
    }

    /// Playback error callback from the media player.
    ///
    /// An error while rendering the preferred asset starts the default
    /// asset on a separate thread: players may deadlock if `set_*_source`
    /// or `play` re-enters from their own callback thread. An error in any
    /// other rendering state ends the session.
    pub fn on_playback_error(&self, source_id: SourceId, error: &str) {
        tracing::debug!(source_id, error, "on_playback_error");
        if !self.is_current_source(source_id) {
            tracing::warn!(source_id, "ignoring playback error for stale source");
            return;
        }

        {
            let mut session = self.inner.session.lock();
            match session.state {
                RendererState::Idle | RendererState::Notifying => {
                    tracing::error!(state = %session.state, "unexpected playback error");
                    return;
                }
                RendererState::RenderingDefault | RendererState::Cancelling => {
                    drop(session);
                    self.rendering_finished();
                    return;
                }
                RendererState::RenderingPreferred => {
                    if !Self::set_state_locked(
                        &self.inner,
                        &mut session,
                        RendererState::RenderingDefault,
                    ) {
                        return;
                    }
                }
            }
        }

        let renderer = self.clone();
        let fallback = thread::spawn(move || {
            if !renderer.start_default_asset() {
                tracing::error!("default asset failed to start after playback error");
                renderer.rendering_finished();
            }
        });
        // A previous session's fallback thread has terminated by the time a
        // new one can exist; replacing the handle only drops a finished one.
        self.inner.session.lock().fallback = Some(fallback);
    }

    /// Load and start the default asset from the session's audio factory.
    fn start_default_asset(&self) -> bool {
        let factory = self.inner.session.lock().audio_factory.clone();
        let Some(factory) = factory else {
            return false;
        };
        let stream = factory();
        let Some(source_id) = self.inner.player.set_stream_source(stream) else {
            return false;
        };
        self.inner.session.lock().source_id = Some(source_id);
        if self.inner.player.play(source_id) {
            tracing::debug!(source_id, "rendering default asset");
            return true;
        }
        false
    }

    /// Terminal path: notify observers, then return to idle and wake any
    /// thread waiting to start the next session.
    fn rendering_finished(&self) {
        {
            let mut session = self.inner.session.lock();
            if !Self::set_state_locked(&self.inner, &mut session, RendererState::Notifying) {
                return;
            }
        }
        self.inner
            .observers
            .notify_observers(|observer| observer.on_rendering_finished());
        let mut session = self.inner.session.lock();
        session.source_id = None;
        session.audio_factory = None;
        Self::set_state_locked(&self.inner, &mut session, RendererState::Idle);
    }

    fn is_current_source(&self, source_id: SourceId) -> bool {
        self.inner.session.lock().source_id == Some(source_id)
    }

    fn set_state(&self, new_state: RendererState) -> bool {
        let mut session = self.inner.session.lock();
        Self::set_state_locked(&self.inner, &mut session, new_state)
    }

    /// Validate and perform a state transition; wakes the entry wait on
    /// success.
    fn set_state_locked(
        inner: &Inner,
        session: &mut MutexGuard<'_, Session>,
        new_state: RendererState,
    ) -> bool {
        let current = session.state;
        let allowed = if new_state == current {
            false
        } else {
            match new_state {
                // Terminal/abort entry: reachable from any active state.
                RendererState::Idle => true,
                RendererState::RenderingPreferred => current == RendererState::Idle,
                RendererState::RenderingDefault => current == RendererState::RenderingPreferred,
                RendererState::Cancelling => matches!(
                    current,
                    RendererState::RenderingPreferred | RendererState::RenderingDefault
                ),
                RendererState::Notifying => current != RendererState::Idle,
            }
        };
        if allowed {
            tracing::debug!(from = %current, to = %new_state, "state transition");
            session.state = new_state;
            inner.wake.notify_all();
        } else {
            tracing::error!(from = %current, to = %new_state, "rejected state transition");
        }
        allowed
    }
}

impl std::fmt::Debug for NotificationRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRenderer")
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The fallback thread holds a clone of the renderer, so the last
        // reference can drop on that very thread; joining it from itself
        // panics. Detach in that case, the thread is already on its way
        // out. Otherwise reap the handle.
        if let Some(fallback) = self.session.get_mut().fallback.take() {
            if fallback.thread().id() != thread::current().id() {
                let _ = fallback.join();
            }
        }
    }
}
