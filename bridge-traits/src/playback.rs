//! Audio output bridge.
//!
//! The player drives exactly one audio output for its whole lifetime. In the
//! browser that is a single `HTMLAudioElement`; on native hosts it can be any
//! engine that can stream a URL. The core never decodes audio itself: it
//! assigns a source, starts and pauses transport, seeks, and listens to the
//! events the output reports back.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Event reported by an [`AudioOutput`].
///
/// These mirror the media element events the coordinator reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AudioOutputEvent {
    /// Playback position advanced (seconds).
    TimeUpdate { position: f64 },
    /// Media metadata loaded; total length is known (seconds).
    DurationChanged { duration: f64 },
    /// The source played through to its natural end.
    Ended,
    /// Playback stalled waiting for data.
    Waiting,
    /// Enough data is buffered to (re)start playback.
    CanPlay,
    /// The output failed to load or decode the current source.
    Error { message: String },
}

impl AudioOutputEvent {
    /// Short, stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            AudioOutputEvent::TimeUpdate { .. } => "timeupdate",
            AudioOutputEvent::DurationChanged { .. } => "loadedmetadata",
            AudioOutputEvent::Ended => "ended",
            AudioOutputEvent::Waiting => "waiting",
            AudioOutputEvent::CanPlay => "canplay",
            AudioOutputEvent::Error { .. } => "error",
        }
    }
}

/// The single shared audio output device.
///
/// Assigning a new source implicitly stops whatever was playing before, so at
/// most one track is audible at any time.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioOutput: PlatformSendSync {
    /// URL currently assigned to the output, if any.
    fn source(&self) -> Option<String>;

    /// Assign a new source URL and begin loading it.
    fn set_source(&self, url: &str) -> Result<()>;

    /// Start or resume transport.
    ///
    /// May be rejected by the host (autoplay policy, unsupported media, load
    /// interrupted by a newer source).
    async fn play(&self) -> Result<()>;

    /// Pause transport without releasing the source.
    fn pause(&self) -> Result<()>;

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Move the playback position (seconds).
    fn set_position(&self, seconds: f64) -> Result<()>;

    /// Apply an output volume in `0.0..=1.0`.
    fn set_volume(&self, volume: f32) -> Result<()>;

    /// Subscribe to output events.
    fn subscribe(&self) -> broadcast::Receiver<AudioOutputEvent>;
}
