//! Playback state store.
//!
//! A pure state holder: no I/O, no knowledge of the audio output. Readers
//! either take a [`PlaybackState`] snapshot or subscribe to a `watch`
//! receiver that always holds the latest value.

use core_async::sync::watch;
use serde::{Deserialize, Serialize};

use crate::models::StreamDescriptor;

/// Default output volume.
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Observable playback state. Exactly one instance exists per player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_track: Option<StreamDescriptor>,
    pub is_playing: bool,
    /// Always within `0.0..=1.0`.
    pub volume: f32,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub is_loading: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::with_volume(DEFAULT_VOLUME)
    }
}

impl PlaybackState {
    pub fn with_volume(volume: f32) -> Self {
        Self {
            current_track: None,
            is_playing: false,
            volume: clamp_volume(volume).unwrap_or(DEFAULT_VOLUME),
            position_secs: 0.0,
            duration_secs: 0.0,
            is_loading: false,
        }
    }

    /// Volume zero reads as muted regardless of how it got there.
    pub fn is_muted(&self) -> bool {
        self.volume == 0.0
    }

    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|t| t.track_id.as_str())
    }
}

/// Clamp into `0.0..=1.0`; `None` for NaN and infinities.
pub fn clamp_volume(volume: f32) -> Option<f32> {
    volume.is_finite().then(|| volume.clamp(0.0, 1.0))
}

/// Holder of the single [`PlaybackState`].
#[derive(Debug)]
pub struct PlaybackStore {
    state: watch::Sender<PlaybackState>,
}

impl Default for PlaybackStore {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}

impl PlaybackStore {
    pub fn new(initial_volume: f32) -> Self {
        let (state, _) = watch::channel(PlaybackState::with_volume(initial_volume));
        Self { state }
    }

    pub fn snapshot(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn current_track(&self) -> Option<StreamDescriptor> {
        self.state.borrow().current_track.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().is_playing
    }

    pub fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    pub fn position(&self) -> f64 {
        self.state.borrow().position_secs
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Replace the current track. Position always restarts at zero.
    pub fn set_current_track(&self, track: Option<StreamDescriptor>) {
        self.state.send_modify(|s| {
            s.current_track = track;
            s.position_secs = 0.0;
        });
    }

    pub fn set_playing(&self, playing: bool) {
        self.state.send_if_modified(|s| replace(&mut s.is_playing, playing));
    }

    /// Flip `is_playing` and return the new value.
    pub fn toggle_play_pause(&self) -> bool {
        let mut playing = false;
        self.state.send_modify(|s| {
            s.is_playing = !s.is_playing;
            playing = s.is_playing;
        });
        playing
    }

    /// Store a clamped volume. Non-finite input leaves the volume unchanged.
    ///
    /// Returns the stored volume.
    pub fn set_volume(&self, volume: f32) -> f32 {
        if let Some(clamped) = clamp_volume(volume) {
            self.state.send_if_modified(|s| replace(&mut s.volume, clamped));
        }
        self.volume()
    }

    pub fn set_position(&self, seconds: f64) {
        self.state
            .send_if_modified(|s| replace(&mut s.position_secs, seconds));
    }

    pub fn set_duration(&self, seconds: f64) {
        self.state
            .send_if_modified(|s| replace(&mut s.duration_secs, seconds));
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|s| replace(&mut s.is_loading, loading));
    }

    /// Apply several field updates as one notification.
    pub fn update(&self, f: impl FnOnce(&mut PlaybackState)) {
        self.state.send_modify(f);
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
