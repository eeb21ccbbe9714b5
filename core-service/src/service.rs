//! The application context.
//!
//! [`CoreService`] owns the single audio output for the lifetime of the page
//! (or host process), builds the stores and the binding around it, and
//! exposes the operations presentation code calls.

use std::sync::Arc;

use bridge_traits::playback::AudioOutput;
use core_async::sync::watch;
use core_playback::{
    AudioEngineBinding, BindingDependencies, EventSubscription, HttpTrackResolver, LibraryTrack,
    LocalPlaylistIds, LocalStore, PlayOutcome, PlaybackState, PlaybackStore, Playlist,
    QueueState, QueueStore, QueueTrack, RecentHistory, TrackResolver,
};
use core_runtime::{
    config::CoreConfig,
    events::{CoreEvent, EventBus, QueueEvent, Receiver},
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{CoreError, Result};

/// Host-provided capabilities that are not part of [`CoreConfig`].
pub struct CoreDependencies {
    /// The one audio output the player drives.
    pub audio_output: Arc<dyn AudioOutput>,
    /// Overrides the HTTP stream resolver built from the config.
    pub resolver: Option<Arc<dyn TrackResolver>>,
}

impl CoreDependencies {
    pub fn new(audio_output: Arc<dyn AudioOutput>) -> Self {
        Self {
            audio_output,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TrackResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

struct ServiceInner {
    config: CoreConfig,
    binding: Arc<AudioEngineBinding>,
    local_playlists: LocalPlaylistIds,
    events: EventBus,
    subscription: Mutex<Option<EventSubscription>>,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

impl CoreService {
    /// Wire the stores, the resolver and the binding.
    ///
    /// Nothing is loaded and no output events are observed until
    /// [`start`](Self::start) is called.
    ///
    /// # Errors
    ///
    /// `CapabilityMissing` when neither a resolver nor an HTTP client is
    /// available.
    pub fn new(config: CoreConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let resolver = match deps.resolver {
            Some(resolver) => resolver,
            None => {
                let client = config.http_client.clone().ok_or_else(|| {
                    CoreError::CapabilityMissing {
                        capability: "HttpClient".to_string(),
                        message: "An HttpClient is required to resolve tracks from the stream \
                                  endpoint. Inject one in the config or provide a TrackResolver."
                            .to_string(),
                    }
                })?;
                Arc::new(HttpTrackResolver::new(client, config.api_base_url.clone()))
                    as Arc<dyn TrackResolver>
            }
        };

        let settings = config.playback;
        let events = EventBus::new(settings.event_buffer_size);
        let local = LocalStore::new(Arc::clone(&config.settings_store));

        let history = Arc::new(RecentHistory::new(
            local.clone(),
            config.storage_keys.recent_tracks.clone(),
            settings.history_capacity,
        ));
        let local_playlists =
            LocalPlaylistIds::new(local, config.storage_keys.local_playlists.clone());

        let binding = Arc::new(AudioEngineBinding::new(
            BindingDependencies {
                output: deps.audio_output,
                resolver,
                playback: Arc::new(PlaybackStore::new(settings.default_volume)),
                queue: Arc::new(QueueStore::new()),
                history,
                events: events.clone(),
            },
            settings,
        ));

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                binding,
                local_playlists,
                events,
                subscription: Mutex::new(None),
            }),
        })
    }

    /// Load persisted client state and start observing the audio output.
    ///
    /// Calling `start` on a running service does nothing.
    pub async fn start(&self) -> Result<()> {
        if self.is_started() {
            return Ok(());
        }

        let recent = self.inner.binding.history().load().await;
        let local_ids = self.inner.local_playlists.load().await;
        let subscription = self.inner.binding.attach()?;
        *self.inner.subscription.lock() = Some(subscription);

        info!(
            recent = recent.len(),
            local_playlists = local_ids.len(),
            "Player core started"
        );
        Ok(())
    }

    /// Pause playback and stop observing the audio output.
    pub async fn shutdown(&self) {
        let subscription = self.inner.subscription.lock().take();
        if let Some(subscription) = subscription {
            self.inner.binding.pause();
            subscription.detach().await;
            info!("Player core stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.inner.subscription.lock().is_some()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// The underlying coordinator, for hosts that need lower-level control.
    pub fn binding(&self) -> &Arc<AudioEngineBinding> {
        &self.inner.binding
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.inner.binding.playback().snapshot()
    }

    pub fn subscribe_playback(&self) -> watch::Receiver<PlaybackState> {
        self.inner.binding.playback().subscribe()
    }

    pub fn queue_state(&self) -> QueueState {
        self.inner.binding.queue().snapshot()
    }

    pub fn subscribe_queue(&self) -> watch::Receiver<QueueState> {
        self.inner.binding.queue().subscribe()
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Play a track picked from search results or the recent list.
    pub async fn load_and_play(&self, track: QueueTrack) -> Result<PlayOutcome> {
        Ok(self.inner.binding.load_and_play(track).await?)
    }

    pub async fn play_from_playlist(&self, playlist_id: &str, index: usize) -> Result<PlayOutcome> {
        Ok(self
            .inner
            .binding
            .play_from_playlist(playlist_id, index)
            .await?)
    }

    pub async fn play_playlist(&self, playlist_id: &str) -> Result<PlayOutcome> {
        Ok(self.inner.binding.play_playlist(playlist_id).await?)
    }

    pub async fn play_library_track(&self, track: LibraryTrack) -> Result<PlayOutcome> {
        Ok(self.inner.binding.play_library_track(track).await?)
    }

    pub async fn toggle_play_pause(&self) -> bool {
        self.inner.binding.toggle_play_pause().await
    }

    pub fn seek(&self, seconds: f64) {
        self.inner.binding.seek(seconds);
    }

    pub async fn skip_next(&self) {
        self.inner.binding.skip_next().await;
    }

    pub async fn skip_previous(&self) {
        self.inner.binding.skip_previous().await;
    }

    pub fn set_volume(&self, volume: f32) -> f32 {
        self.inner.binding.set_volume(volume)
    }

    pub fn toggle_mute(&self) -> f32 {
        self.inner.binding.toggle_mute()
    }

    // ========================================================================
    // Playlists
    // ========================================================================

    /// Replace the known playlists, e.g. after fetching them from the API.
    pub fn set_playlists(&self, playlists: Vec<Playlist>) {
        let count = playlists.len();
        self.inner.binding.queue().set_playlists(playlists);
        self.emit_queue(QueueEvent::PlaylistsChanged { count });
    }

    /// Insert or replace a single playlist by id.
    pub fn upsert_playlist(&self, playlist: Playlist) {
        let queue = self.inner.binding.queue();
        queue.upsert_playlist(playlist);
        let count = queue.playlists().len();
        self.emit_queue(QueueEvent::PlaylistsChanged { count });
    }

    /// Forget a playlist. Clears navigation when it was the active one.
    pub async fn remove_playlist(&self, playlist_id: &str) -> bool {
        let queue = self.inner.binding.queue();
        let was_active = queue.active_playlist_id().as_deref() == Some(playlist_id);
        let removed = queue.remove_playlist(playlist_id);

        if was_active {
            self.emit_queue(QueueEvent::ActivePlaylistChanged { playlist_id: None });
        }
        if removed {
            self.emit_queue(QueueEvent::PlaylistsChanged {
                count: queue.playlists().len(),
            });
        }
        self.inner.local_playlists.remove(playlist_id).await;
        removed
    }

    pub fn playlist(&self, playlist_id: &str) -> Option<Playlist> {
        self.inner.binding.queue().get_playlist(playlist_id)
    }

    pub fn is_track_in_playlist(&self, playlist_id: &str, video_id: &str) -> bool {
        self.inner
            .binding
            .queue()
            .is_track_in_playlist(playlist_id, video_id)
    }

    // ========================================================================
    // Client-local state
    // ========================================================================

    /// Most recently played tracks, newest first.
    pub fn recent_tracks(&self) -> Vec<QueueTrack> {
        self.inner.binding.history().tracks()
    }

    pub async fn clear_recent_tracks(&self) {
        self.inner.binding.history().clear().await;
    }

    /// Ids of playlists created on this device without an account.
    pub fn local_playlist_ids(&self) -> Vec<String> {
        self.inner.local_playlists.ids()
    }

    pub async fn remember_local_playlist(&self, playlist_id: &str) {
        self.inner.local_playlists.add(playlist_id).await;
    }

    pub async fn forget_local_playlist(&self, playlist_id: &str) {
        self.inner.local_playlists.remove(playlist_id).await;
    }

    pub async fn clear_local_playlists(&self) {
        self.inner.local_playlists.clear().await;
    }

    fn emit_queue(&self, event: QueueEvent) {
        debug!(?event, "Queue event");
        self.inner.events.emit(CoreEvent::Queue(event)).ok();
    }
}
