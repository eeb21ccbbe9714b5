//! # Audio Engine Binding
//!
//! Binds the single shared [`AudioOutput`] to the [`PlaybackStore`] and the
//! [`QueueStore`].
//!
//! ## Overview
//!
//! - User intent arrives through the façade methods (`load_and_play`,
//!   `skip_next`, `seek`, ...), which mutate the stores and reconcile the
//!   output.
//! - Output events arrive through the pump started by
//!   [`AudioEngineBinding::attach`] and are mirrored back into the stores.
//!   Natural completion is the only automatic transition: it advances through
//!   the active playlist.
//!
//! ## Out-of-order resolution
//!
//! Every resolve carries a request token. When a response arrives after a
//! newer request has started, it is dropped without touching the current
//! track, the queue index or the loading flag.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use bridge_traits::playback::{AudioOutput, AudioOutputEvent};
use core_async::{
    sync::{broadcast::error::RecvError, oneshot},
    task::JoinHandle,
};
use core_runtime::{
    config::PlaybackSettings,
    events::{CoreEvent, EventBus, NotificationEvent, PlaybackEvent, QueueEvent},
    logging::redact_url_query,
};
use futures::future::{select, Either};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    error::{PlaybackError, Result},
    models::{LibraryTrack, QueueTrack, StreamDescriptor},
    persistence::RecentHistory,
    queue::QueueStore,
    resolver::TrackResolver,
    state::PlaybackStore,
};

/// Transport state of the shared output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// No source, or the queue ran out.
    Idle,
    /// Source assigned, not yet started.
    Loading,
    Playing,
    Paused,
    /// The output reported a fault. Behaves like `Idle`.
    Errored,
}

/// What to do once a track is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadIntent {
    Play,
    /// Load without starting transport.
    Cue,
}

/// Result of a façade play request.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// A new track was loaded and transport start was requested.
    Started(StreamDescriptor),
    /// The requested track was already current; transport was toggled.
    Toggled { playing: bool },
    /// A newer request took over before this one resolved.
    Superseded,
}

/// Where a play request came from. Drives notification text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayContext {
    Search,
    Playlist,
    Navigation,
}

/// Collaborators the binding drives.
pub struct BindingDependencies {
    pub output: Arc<dyn AudioOutput>,
    pub resolver: Arc<dyn TrackResolver>,
    pub playback: Arc<PlaybackStore>,
    pub queue: Arc<QueueStore>,
    pub history: Arc<RecentHistory>,
    pub events: EventBus,
}

/// The playback/queue coordinator.
pub struct AudioEngineBinding {
    output: Arc<dyn AudioOutput>,
    resolver: Arc<dyn TrackResolver>,
    playback: Arc<PlaybackStore>,
    queue: Arc<QueueStore>,
    history: Arc<RecentHistory>,
    events: EventBus,
    settings: PlaybackSettings,
    transport: Mutex<TransportState>,
    request_token: AtomicU64,
    pre_mute_volume: Mutex<Option<f32>>,
    attached: Arc<AtomicBool>,
}

impl AudioEngineBinding {
    pub fn new(deps: BindingDependencies, settings: PlaybackSettings) -> Self {
        Self {
            output: deps.output,
            resolver: deps.resolver,
            playback: deps.playback,
            queue: deps.queue,
            history: deps.history,
            events: deps.events,
            settings,
            transport: Mutex::new(TransportState::Idle),
            request_token: AtomicU64::new(0),
            pre_mute_volume: Mutex::new(None),
            attached: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn playback(&self) -> &Arc<PlaybackStore> {
        &self.playback
    }

    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.queue
    }

    pub fn history(&self) -> &Arc<RecentHistory> {
        &self.history
    }

    pub fn transport_state(&self) -> TransportState {
        *self.transport.lock()
    }

    // ========================================================================
    // Event subscription
    // ========================================================================

    /// Subscribe to the output and start mirroring its events.
    ///
    /// Pushes the stored volume to the output first. Only one subscription
    /// may be active at a time. Detaching or dropping the handle stops the
    /// pump; a new subscription is refused until the old pump has exited,
    /// which [`EventSubscription::detach`] waits for.
    pub fn attach(self: &Arc<Self>) -> Result<EventSubscription> {
        if self.attached.swap(true, Ordering::SeqCst) {
            return Err(PlaybackError::Internal(
                "audio output is already attached".to_string(),
            ));
        }

        if let Err(e) = self.output.set_volume(self.playback.volume()) {
            warn!(error = %e, "Failed to apply initial volume");
        }

        let mut receiver = self.output.subscribe();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let binding = Arc::clone(self);

        let handle = core_async::spawn(async move {
            debug!("Audio output event pump started");
            loop {
                let next = receiver.recv();
                futures::pin_mut!(next);
                // Shutdown is polled first so a stopped pump never handles
                // an event that is also queued for its successor.
                match select(&mut shutdown_rx, next).await {
                    Either::Left(_) => break,
                    Either::Right((Ok(event), _)) => binding.handle_output_event(event).await,
                    Either::Right((Err(RecvError::Lagged(skipped)), _)) => {
                        warn!(skipped, "Audio output events dropped");
                    }
                    Either::Right((Err(RecvError::Closed), _)) => break,
                }
            }
            binding.attached.store(false, Ordering::SeqCst);
            debug!("Audio output event pump stopped");
        });

        Ok(EventSubscription {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
            attached: Arc::clone(&self.attached),
        })
    }

    /// Mirror one output event into the stores.
    pub async fn handle_output_event(&self, event: AudioOutputEvent) {
        match event {
            AudioOutputEvent::TimeUpdate { position } => {
                if position.is_finite() {
                    self.playback.set_position(position);
                }
            }
            AudioOutputEvent::DurationChanged { duration } => {
                if duration.is_finite() {
                    self.playback.set_duration(duration);
                }
            }
            AudioOutputEvent::Waiting => self.playback.set_loading(true),
            AudioOutputEvent::CanPlay => {
                self.playback.set_loading(false);
                let mut transport = self.transport.lock();
                if *transport == TransportState::Loading {
                    *transport = TransportState::Paused;
                }
            }
            AudioOutputEvent::Ended => {
                if let Some(track_id) = self.current_track_id() {
                    self.emit(PlaybackEvent::Completed { track_id });
                }
                self.advance().await;
            }
            AudioOutputEvent::Error { message } => {
                error!(%message, "Audio output fault");
                self.playback.update(|s| {
                    s.is_playing = false;
                    s.is_loading = false;
                });
                self.set_transport(TransportState::Errored);
                self.emit(PlaybackEvent::Error {
                    track_id: self.current_track_id(),
                    message,
                    recoverable: false,
                });
            }
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Make `descriptor` the current track and reconcile the output.
    ///
    /// The output is only reloaded when the URL differs from the assigned
    /// source.
    pub async fn load_track(&self, descriptor: StreamDescriptor, intent: LoadIntent) {
        let reload = self.output.source().as_deref() != Some(descriptor.audio_url.as_str());
        let track_id = descriptor.track_id.clone();
        let title = descriptor.title.clone();

        if reload {
            debug!(
                track_id = %track_id,
                url = %redact_url_query(&descriptor.audio_url),
                "Assigning audio source"
            );
            if let Err(e) = self.output.set_source(&descriptor.audio_url) {
                warn!(track_id = %track_id, error = %e, "Audio output rejected source");
                self.playback.set_current_track(Some(descriptor));
                self.playback.update(|s| s.is_playing = false);
                self.set_transport(TransportState::Errored);
                return;
            }
            self.set_transport(TransportState::Loading);
        }
        self.playback.set_current_track(Some(descriptor));

        match intent {
            LoadIntent::Play => {
                if self.start_transport().await {
                    info!(track_id = %track_id, "Now playing");
                    self.emit(PlaybackEvent::Started { track_id, title });
                } else {
                    // The source stays assigned; the next play resumes it.
                    self.playback.set_playing(false);
                    self.set_transport(TransportState::Paused);
                }
            }
            LoadIntent::Cue => {
                self.playback.set_playing(false);
                if !reload {
                    self.set_transport(TransportState::Paused);
                }
            }
        }
    }

    /// Resume transport. Failures are logged and leave `is_playing` as is.
    pub async fn play(&self) {
        let Some(track_id) = self.current_track_id() else {
            debug!("Play requested with no track loaded");
            return;
        };
        if self.start_transport().await {
            self.emit(PlaybackEvent::Resumed {
                track_id,
                position_ms: to_millis(self.output.position()),
            });
        }
    }

    /// Pause transport. Failures are logged and leave `is_playing` as is.
    pub fn pause(&self) {
        if let Err(e) = self.output.pause() {
            warn!(error = %e, "Pause failed");
            return;
        }
        self.playback.set_playing(false);
        self.set_transport(TransportState::Paused);
        if let Some(track_id) = self.current_track_id() {
            self.emit(PlaybackEvent::Paused {
                track_id,
                position_ms: to_millis(self.output.position()),
            });
        }
    }

    /// Flip between playing and paused. Returns whether playback is now on.
    pub async fn toggle_play_pause(&self) -> bool {
        if self.playback.is_playing() {
            self.pause();
        } else {
            self.play().await;
        }
        self.playback.is_playing()
    }

    /// Move the playback position. Non-finite targets are ignored.
    pub fn seek(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let seconds = seconds.max(0.0);
        if let Err(e) = self.output.set_position(seconds) {
            warn!(seconds, error = %e, "Seek failed");
            return;
        }
        self.playback.set_position(seconds);
        self.emit(PlaybackEvent::PositionSought {
            track_id: self.current_track_id(),
            position_ms: to_millis(seconds),
        });
    }

    /// Store a clamped volume and apply it. Returns the stored volume.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let stored = self.playback.set_volume(volume);
        if !volume.is_finite() {
            return stored;
        }
        self.apply_volume(stored);
        if stored > 0.0 {
            *self.pre_mute_volume.lock() = None;
        }
        stored
    }

    /// Mute, or restore the volume from before muting.
    ///
    /// Returns the new volume.
    pub fn toggle_mute(&self) -> f32 {
        let current = self.playback.volume();
        let target = if current == 0.0 {
            self.pre_mute_volume
                .lock()
                .take()
                .filter(|v| *v > 0.0)
                .unwrap_or(self.settings.default_volume)
        } else {
            *self.pre_mute_volume.lock() = Some(current);
            0.0
        };
        let stored = self.playback.set_volume(target);
        self.apply_volume(stored);
        stored
    }

    pub fn is_muted(&self) -> bool {
        self.playback.volume() == 0.0
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Move to the next track of the active playlist, or stop when there is
    /// none. Also runs on natural completion.
    pub async fn skip_next(&self) {
        self.advance().await;
    }

    /// Restart the current track, or move back one track when playback is
    /// still near the start.
    pub async fn skip_previous(&self) {
        let position = self.output.position();
        if position > self.settings.restart_threshold_secs {
            debug!(position, "Restarting current track");
            self.restart();
            return;
        }
        match self.queue.get_previous_track() {
            Some((index, track)) => {
                // Failures are already reported and logged.
                let _ = self.resolve_and_play(&track, Some(index), PlayContext::Navigation).await;
            }
            None => self.restart(),
        }
    }

    async fn advance(&self) {
        match self.queue.get_next_track() {
            Some((index, track)) => {
                debug!(index, track_id = %track.video_id, "Advancing");
                let _ = self.resolve_and_play(&track, Some(index), PlayContext::Navigation).await;
            }
            None => self.stop(),
        }
    }

    /// Halt at the end of the queue. The source stays assigned.
    fn stop(&self) {
        if let Err(e) = self.output.pause() {
            warn!(error = %e, "Pause failed while stopping");
        }
        if let Err(e) = self.output.set_position(0.0) {
            warn!(error = %e, "Rewind failed while stopping");
        }
        self.playback.update(|s| {
            s.is_playing = false;
            s.position_secs = 0.0;
        });
        self.set_transport(TransportState::Idle);
        info!("Queue finished");
        self.emit(PlaybackEvent::Stopped {
            track_id: self.current_track_id(),
        });
    }

    fn restart(&self) {
        if let Err(e) = self.output.set_position(0.0) {
            warn!(error = %e, "Restart failed");
            return;
        }
        self.playback.set_position(0.0);
        self.emit(PlaybackEvent::PositionSought {
            track_id: self.current_track_id(),
            position_ms: 0,
        });
    }

    // ========================================================================
    // Façade
    // ========================================================================

    /// Play a track picked from search results or the recent list.
    ///
    /// Reselecting the current track toggles play/pause. Otherwise the active
    /// playlist is cleared and the track is resolved and played.
    pub async fn load_and_play(&self, track: QueueTrack) -> Result<PlayOutcome> {
        if let Some(outcome) = self.toggle_if_current(|current| track.is_same_track(current)).await {
            return Ok(outcome);
        }
        self.set_active_playlist(None);
        self.resolve_and_play(&track, None, PlayContext::Search).await
    }

    /// Play the track at `index` of `playlist_id`, making it the active
    /// playlist.
    pub async fn play_from_playlist(&self, playlist_id: &str, index: usize) -> Result<PlayOutcome> {
        let track = self.playlist_track(playlist_id, index)?;
        if let Some(outcome) = self.toggle_if_current(|current| track.is_same_track(current)).await {
            return Ok(outcome);
        }
        if self.queue.active_playlist_id().as_deref() != Some(playlist_id) {
            self.set_active_playlist(Some(playlist_id.to_string()));
        }
        self.resolve_and_play(&track, Some(index), PlayContext::Playlist).await
    }

    /// Start `playlist_id` from its first track.
    pub async fn play_playlist(&self, playlist_id: &str) -> Result<PlayOutcome> {
        let track = self.playlist_track(playlist_id, 0)?;
        self.set_active_playlist(Some(playlist_id.to_string()));
        self.resolve_and_play(&track, Some(0), PlayContext::Playlist).await
    }

    /// Play an already-resolved library entry.
    pub async fn play_library_track(&self, track: LibraryTrack) -> Result<PlayOutcome> {
        if let Some(outcome) = self
            .toggle_if_current(|current| current.track_id == track.track_id)
            .await
        {
            return Ok(outcome);
        }
        // Nothing to resolve, but any resolve still in flight is now stale.
        self.next_token();
        self.set_active_playlist(None);

        let descriptor = StreamDescriptor::from(&track);
        self.load_track(descriptor.clone(), LoadIntent::Play).await;
        self.playback.set_loading(false);
        self.notify(NotificationEvent::info("Playing from library"));
        Ok(PlayOutcome::Started(descriptor))
    }

    fn playlist_track(&self, playlist_id: &str, index: usize) -> Result<QueueTrack> {
        let playlist = self
            .queue
            .get_playlist(playlist_id)
            .ok_or_else(|| PlaybackError::PlaylistNotFound(playlist_id.to_string()))?;
        playlist
            .track(index)
            .cloned()
            .ok_or_else(|| PlaybackError::IndexOutOfRange {
                playlist_id: playlist_id.to_string(),
                index,
                len: playlist.len(),
            })
    }

    async fn toggle_if_current(
        &self,
        is_current: impl FnOnce(&StreamDescriptor) -> bool,
    ) -> Option<PlayOutcome> {
        let current = self.playback.current_track()?;
        if !is_current(&current) {
            return None;
        }
        let playing = self.toggle_play_pause().await;
        Some(PlayOutcome::Toggled { playing })
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn next_token(&self) -> u64 {
        self.request_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, token: u64) -> bool {
        self.request_token.load(Ordering::SeqCst) == token
    }

    /// Resolve `track`, then load and play it.
    ///
    /// `index` is written to the queue only once the resolve succeeds.
    async fn resolve_and_play(
        &self,
        track: &QueueTrack,
        index: Option<usize>,
        context: PlayContext,
    ) -> Result<PlayOutcome> {
        let token = self.next_token();
        self.playback.set_loading(true);
        debug!(token, track_id = %track.video_id, "Resolving track");

        let result = self.resolver.resolve(&track.video_id).await;
        if !self.is_latest(token) {
            debug!(token, track_id = %track.video_id, "Discarding stale resolve");
            return Ok(PlayOutcome::Superseded);
        }

        let descriptor = match result {
            Ok(descriptor) => descriptor,
            Err(e) => {
                self.fail_resolve(&track.video_id, &e);
                return Err(e);
            }
        };

        if let Some(index) = index {
            self.queue.set_current_index(index);
            self.emit_queue(QueueEvent::IndexChanged {
                playlist_id: self.queue.active_playlist_id(),
                index: Some(index),
            });
        }
        self.load_track(descriptor.clone(), LoadIntent::Play).await;
        if self.is_latest(token) {
            self.playback.set_loading(false);
        }

        match context {
            PlayContext::Search => {
                self.history.push(track.clone()).await;
                if descriptor.served_from_cache {
                    self.notify(NotificationEvent::info("Playing from cache"));
                } else {
                    self.notify(NotificationEvent::success("Track ready"));
                }
            }
            PlayContext::Playlist => {
                self.history.push(track.clone()).await;
                self.notify(NotificationEvent::info("Playing from playlist"));
            }
            PlayContext::Navigation => {}
        }

        Ok(PlayOutcome::Started(descriptor))
    }

    fn fail_resolve(&self, track_id: &str, e: &PlaybackError) {
        error!(track_id, error = %e, "Failed to resolve track");
        if self.playback.is_playing() {
            if let Err(e) = self.output.pause() {
                warn!(error = %e, "Pause failed after resolve error");
            }
        }
        self.playback.update(|s| {
            s.is_loading = false;
            s.is_playing = false;
        });
        let mut transport = self.transport.lock();
        if *transport == TransportState::Playing {
            *transport = TransportState::Paused;
        }
        drop(transport);

        self.emit(PlaybackEvent::Error {
            track_id: Some(track_id.to_string()),
            message: e.to_string(),
            recoverable: e.is_retryable(),
        });
        if e.is_retryable() {
            self.notify(NotificationEvent::retry(e.user_message()));
        } else {
            self.notify(NotificationEvent::error(e.user_message()));
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn start_transport(&self) -> bool {
        match self.output.play().await {
            Ok(()) => {
                self.playback.set_playing(true);
                self.set_transport(TransportState::Playing);
                true
            }
            Err(e) => {
                warn!(error = %e, "Play failed");
                false
            }
        }
    }

    fn apply_volume(&self, volume: f32) {
        if let Err(e) = self.output.set_volume(volume) {
            warn!(volume, error = %e, "Failed to apply volume");
        }
    }

    fn set_active_playlist(&self, id: Option<String>) {
        let changed = self.queue.active_playlist_id() != id;
        self.queue.set_active_playlist(id.clone());
        if changed {
            self.emit_queue(QueueEvent::ActivePlaylistChanged { playlist_id: id });
        }
    }

    fn set_transport(&self, state: TransportState) {
        let mut transport = self.transport.lock();
        if *transport != state {
            debug!(from = ?*transport, to = ?state, "Transport state changed");
            *transport = state;
        }
    }

    fn current_track_id(&self) -> Option<String> {
        self.playback.current_track().map(|t| t.track_id)
    }

    fn emit(&self, event: PlaybackEvent) {
        self.events.emit(CoreEvent::Playback(event)).ok();
    }

    fn emit_queue(&self, event: QueueEvent) {
        self.events.emit(CoreEvent::Queue(event)).ok();
    }

    fn notify(&self, event: NotificationEvent) {
        self.events.emit(CoreEvent::Notification(event)).ok();
    }
}

fn to_millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0) as u64
    } else {
        0
    }
}

/// Live subscription of a binding to its audio output.
///
/// Dropping the handle signals the event pump to stop without waiting for
/// it; the binding accepts a new subscription once the pump has exited.
pub struct EventSubscription {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    attached: Arc<AtomicBool>,
}

impl EventSubscription {
    /// Stop the event pump and wait for it to finish.
    pub async fn detach(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Audio output event pump ended abnormally");
                // The pump did not get to release the binding.
                self.attached.store(false, Ordering::SeqCst);
            }
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
