use std::io::Read;
use std::sync::Arc;

/// Opaque handle identifying one source loaded into a media player.
pub type SourceId = u64;

/// Container format hint for a raw audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Mpeg,
    Wav,
    Unknown,
}

/// A raw audio asset produced by an audio factory.
pub struct AudioStream {
    pub media_type: MediaType,
    pub reader: Box<dyn Read + Send>,
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream")
            .field("media_type", &self.media_type)
            .finish()
    }
}

/// Produces the default (built-in) audio asset on demand.
pub type AudioFactory = Arc<dyn Fn() -> AudioStream + Send + Sync>;

/// Playback surface the renderer drives.
///
/// Implementations are expected to deliver playback lifecycle callbacks
/// (started/stopped/finished/error) back into
/// [`crate::NotificationRenderer`] from their own threads; the renderer
/// never calls `set_*_source` or `play` from inside such a callback, since
/// player implementations may deadlock on that kind of reentry.
pub trait MediaPlayer: Send + Sync {
    /// Load a remote asset by URL. `None` means the source was rejected.
    fn set_url_source(&self, url: &str) -> Option<SourceId>;

    /// Load a raw audio stream. `None` means the source was rejected.
    fn set_stream_source(&self, stream: AudioStream) -> Option<SourceId>;

    /// Start playback of a previously loaded source.
    fn play(&self, source_id: SourceId) -> bool;

    /// Request playback stop; completion is signalled via the stopped
    /// callback, which is assumed to eventually fire.
    fn stop(&self, source_id: SourceId) -> bool;
}

/// Receives the terminal notification for a rendering session.
pub trait RendererObserver: Send + Sync {
    /// The session finished, failed after playback genuinely started, or
    /// was cancelled. No payload; observers query final state elsewhere if
    /// they need it.
    fn on_rendering_finished(&self);
}
