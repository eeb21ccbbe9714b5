//! Integration tests for the audio engine binding.
//!
//! The binding is driven against a fake audio output, a scripted resolver and
//! an in-memory settings store.

#![cfg(not(target_arch = "wasm32"))]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    playback::{AudioOutput, AudioOutputEvent},
    storage::SettingsStore,
};
use core_playback::{
    AudioEngineBinding, BindingDependencies, LibraryTrack, LocalStore, PlayOutcome,
    PlaybackError, PlaybackStore, Playlist, QueueStore, QueueTrack, RecentHistory, Result,
    StreamDescriptor, TrackResolver, TransportState,
};
use core_runtime::{
    config::PlaybackSettings,
    events::{CoreEvent, EventBus, NotificationLevel, PlaybackEvent, Receiver},
};
use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Fake AudioOutput
// ============================================================================

#[derive(Default)]
struct OutputState {
    source: Option<String>,
    position: f64,
    volume: f32,
    playing: bool,
    source_assignments: usize,
    reject_play: bool,
}

struct FakeAudioOutput {
    state: Mutex<OutputState>,
    events: broadcast::Sender<AudioOutputEvent>,
}

impl FakeAudioOutput {
    fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(OutputState::default()),
            events,
        }
    }

    fn emit(&self, event: AudioOutputEvent) {
        let _ = self.events.send(event);
    }

    fn set_elapsed(&self, seconds: f64) {
        self.state.lock().position = seconds;
    }

    fn reject_play(&self, reject: bool) {
        self.state.lock().reject_play = reject;
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn source_assignments(&self) -> usize {
        self.state.lock().source_assignments
    }
}

#[async_trait::async_trait]
impl AudioOutput for FakeAudioOutput {
    fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    fn set_source(&self, url: &str) -> BridgeResult<()> {
        let mut state = self.state.lock();
        state.source = Some(url.to_string());
        state.position = 0.0;
        state.playing = false;
        state.source_assignments += 1;
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let mut state = self.state.lock();
        if state.reject_play {
            return Err(BridgeError::PlaybackRejected("autoplay blocked".into()));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        self.state.lock().playing = false;
        Ok(())
    }

    fn position(&self) -> f64 {
        self.state.lock().position
    }

    fn set_position(&self, seconds: f64) -> BridgeResult<()> {
        self.state.lock().position = seconds;
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> BridgeResult<()> {
        self.state.lock().volume = volume;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AudioOutputEvent> {
        self.events.subscribe()
    }
}

// ============================================================================
// Scripted resolver
// ============================================================================

#[derive(Clone)]
enum Script {
    Ready { cached: bool },
    NotReady,
    Missing,
    Gated(Arc<Notify>),
}

#[derive(Default)]
struct ScriptedResolver {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    fn script(&self, id: &str, script: Script) {
        self.scripts.lock().insert(id.to_string(), script);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

fn descriptor(id: &str, cached: bool) -> StreamDescriptor {
    StreamDescriptor {
        track_id: id.to_string(),
        title: format!("Title {id}"),
        artist: "Artist".to_string(),
        thumbnail_url: String::new(),
        duration_secs: 180.0,
        audio_url: format!("https://cdn.example.com/{id}.m4a?sig=secret"),
        served_from_cache: cached,
    }
}

#[async_trait::async_trait]
impl TrackResolver for ScriptedResolver {
    async fn resolve(&self, track_id: &str) -> Result<StreamDescriptor> {
        self.calls.lock().push(track_id.to_string());
        let script = self
            .scripts
            .lock()
            .get(track_id)
            .cloned()
            .unwrap_or(Script::Ready { cached: false });
        match script {
            Script::Ready { cached } => Ok(descriptor(track_id, cached)),
            Script::NotReady => Err(PlaybackError::NotReady(track_id.to_string())),
            Script::Missing => Err(PlaybackError::TrackNotFound(track_id.to_string())),
            Script::Gated(gate) => {
                gate.notified().await;
                Ok(descriptor(track_id, false))
            }
        }
    }
}

// ============================================================================
// In-memory settings store
// ============================================================================

#[derive(Default)]
struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait::async_trait]
impl SettingsStore for MemoryStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }
    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    binding: Arc<AudioEngineBinding>,
    output: Arc<FakeAudioOutput>,
    resolver: Arc<ScriptedResolver>,
    events: Receiver<CoreEvent>,
}

impl Harness {
    fn new() -> Self {
        let output = Arc::new(FakeAudioOutput::new());
        let resolver = Arc::new(ScriptedResolver::default());
        let bus = EventBus::new(256);
        let events = bus.subscribe();
        let history = RecentHistory::new(
            LocalStore::new(Arc::new(MemoryStore::default())),
            "peerless_recent_tracks",
            10,
        );
        let binding = AudioEngineBinding::new(
            BindingDependencies {
                output: output.clone(),
                resolver: resolver.clone(),
                playback: Arc::new(PlaybackStore::new(0.8)),
                queue: Arc::new(QueueStore::new()),
                history: Arc::new(history),
                events: bus,
            },
            PlaybackSettings::default(),
        );
        Self {
            binding: Arc::new(binding),
            output,
            resolver,
            events,
        }
    }

    fn with_playlist(self, id: &str, tracks: &[&str]) -> Self {
        let tracks = tracks
            .iter()
            .map(|v| QueueTrack::new(*v, format!("Title {v}"), "Artist"))
            .collect();
        self.binding
            .queue()
            .upsert_playlist(Playlist::new(id, format!("Playlist {id}"), tracks));
        self
    }

    fn drain(&mut self) -> Vec<CoreEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    fn notifications(&mut self) -> Vec<(NotificationLevel, String)> {
        self.drain()
            .into_iter()
            .filter_map(|e| match e {
                CoreEvent::Notification(n) => Some((n.level, n.message)),
                _ => None,
            })
            .collect()
    }
}

fn search_track(id: &str) -> QueueTrack {
    QueueTrack::new(id, format!("Title {id}"), "Artist")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

// ============================================================================
// Advance
// ============================================================================

#[tokio::test]
async fn test_advance_moves_to_next_index() {
    let h = Harness::new().with_playlist("p", &["a", "b", "c"]);
    h.binding.play_from_playlist("p", 0).await.unwrap();

    h.binding.skip_next().await;

    let queue = h.binding.queue();
    assert_eq!(queue.current_index(), Some(1));
    assert_eq!(h.resolver.calls(), vec!["a", "b"]);
    let state = h.binding.playback().snapshot();
    assert_eq!(state.current_track_id(), Some("b"));
    assert!(state.is_playing);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_advance_at_last_index_stops() {
    let h = Harness::new().with_playlist("p", &["a", "b"]);
    h.binding.play_from_playlist("p", 1).await.unwrap();
    h.output.set_elapsed(42.0);

    h.binding.skip_next().await;

    let state = h.binding.playback().snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.position_secs, 0.0);
    assert_eq!(h.output.position(), 0.0);
    assert!(!h.output.is_playing());
    assert_eq!(h.binding.queue().active_playlist_id().as_deref(), Some("p"));
    assert_eq!(h.binding.queue().current_index(), Some(1));
    assert_eq!(h.binding.transport_state(), TransportState::Idle);
    assert_eq!(h.resolver.calls(), vec!["b"]);
}

#[tokio::test]
async fn test_advance_without_active_playlist_stops() {
    let h = Harness::new();
    h.binding.load_and_play(search_track("solo")).await.unwrap();

    h.binding.skip_next().await;

    assert!(!h.binding.playback().is_playing());
    assert_eq!(h.resolver.calls(), vec!["solo"]);
    // The source stays assigned.
    assert!(h.output.source().is_some());
}

#[tokio::test]
async fn test_advance_failure_keeps_index() {
    let h = Harness::new().with_playlist("p", &["a", "b"]);
    h.resolver.script("b", Script::Missing);
    h.binding.play_from_playlist("p", 0).await.unwrap();

    h.binding.skip_next().await;

    let state = h.binding.playback().snapshot();
    assert_eq!(h.binding.queue().current_index(), Some(0));
    assert!(!state.is_loading);
    assert!(!state.is_playing);
    assert_eq!(state.current_track_id(), Some("a"));
}

// ============================================================================
// Skip previous
// ============================================================================

#[tokio::test]
async fn test_skip_previous_past_threshold_restarts() {
    let h = Harness::new().with_playlist("p", &["a", "b"]);
    h.binding.play_from_playlist("p", 1).await.unwrap();
    h.output.set_elapsed(5.0);

    h.binding.skip_previous().await;

    assert_eq!(h.output.position(), 0.0);
    assert_eq!(h.binding.playback().position(), 0.0);
    assert_eq!(h.binding.queue().current_index(), Some(1));
    assert_eq!(h.resolver.calls(), vec!["b"]);
}

#[tokio::test]
async fn test_skip_previous_at_first_index_restarts() {
    let h = Harness::new().with_playlist("p", &["a", "b"]);
    h.binding.play_from_playlist("p", 0).await.unwrap();
    h.output.set_elapsed(1.0);

    h.binding.skip_previous().await;

    assert_eq!(h.output.position(), 0.0);
    assert_eq!(h.binding.queue().current_index(), Some(0));
    assert_eq!(h.resolver.calls(), vec!["a"]);
    assert!(h.binding.playback().is_playing());
}

#[tokio::test]
async fn test_skip_previous_near_start_moves_back() {
    let h = Harness::new().with_playlist("p", &["a", "b"]);
    h.binding.play_from_playlist("p", 1).await.unwrap();
    h.output.set_elapsed(2.0);

    h.binding.skip_previous().await;

    assert_eq!(h.binding.queue().current_index(), Some(0));
    assert_eq!(h.resolver.calls(), vec!["b", "a"]);
    assert_eq!(
        h.binding.playback().snapshot().current_track_id(),
        Some("a")
    );
}

// ============================================================================
// Façade
// ============================================================================

#[tokio::test]
async fn test_reselecting_current_track_toggles() {
    let mut h = Harness::new();
    h.binding.load_and_play(search_track("a")).await.unwrap();
    h.drain();

    let outcome = h.binding.load_and_play(search_track("a")).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Toggled { playing: false });
    assert!(!h.output.is_playing());

    let outcome = h.binding.load_and_play(search_track("a")).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Toggled { playing: true });
    assert_eq!(h.resolver.calls(), vec!["a"]);
    assert_eq!(h.output.source_assignments(), 1);
}

#[tokio::test]
async fn test_load_and_play_clears_active_playlist_and_records_history() {
    let mut h = Harness::new().with_playlist("p", &["a", "b"]);
    h.binding.play_from_playlist("p", 0).await.unwrap();
    h.drain();

    h.binding.load_and_play(search_track("x")).await.unwrap();

    assert!(h.binding.queue().active_playlist_id().is_none());
    assert!(h.binding.queue().current_index().is_none());
    let history: Vec<String> = h
        .binding
        .history()
        .tracks()
        .into_iter()
        .map(|t| t.video_id)
        .collect();
    assert_eq!(history, vec!["x", "a"]);
    assert_eq!(
        h.notifications(),
        vec![(NotificationLevel::Success, "Track ready".to_string())]
    );
}

#[tokio::test]
async fn test_cached_track_notification() {
    let mut h = Harness::new();
    h.resolver.script("a", Script::Ready { cached: true });

    h.binding.load_and_play(search_track("a")).await.unwrap();

    assert_eq!(
        h.notifications(),
        vec![(NotificationLevel::Info, "Playing from cache".to_string())]
    );
}

#[tokio::test]
async fn test_not_ready_publishes_retry_notification() {
    let mut h = Harness::new();
    h.resolver.script("a", Script::NotReady);

    let err = h.binding.load_and_play(search_track("a")).await.unwrap_err();
    assert!(err.is_retryable());

    let state = h.binding.playback().snapshot();
    assert!(!state.is_loading);
    assert!(!state.is_playing);
    assert!(state.current_track.is_none());

    let notifications = h.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, NotificationLevel::Retry);
    assert!(notifications[0].1.contains("try again"));
}

#[tokio::test]
async fn test_hard_failure_publishes_error_notification() {
    let mut h = Harness::new();
    h.resolver.script("a", Script::Missing);

    let err = h.binding.load_and_play(search_track("a")).await.unwrap_err();
    assert!(matches!(err, PlaybackError::TrackNotFound(_)));
    assert_eq!(
        h.notifications(),
        vec![(NotificationLevel::Error, "Failed to load track".to_string())]
    );
    assert!(h.binding.history().tracks().is_empty());
}

#[tokio::test]
async fn test_play_rejection_leaves_not_playing() {
    let h = Harness::new();
    h.output.reject_play(true);

    let outcome = h.binding.load_and_play(search_track("a")).await.unwrap();

    assert!(matches!(outcome, PlayOutcome::Started(_)));
    let state = h.binding.playback().snapshot();
    assert!(!state.is_playing);
    assert!(!state.is_loading);
    assert_eq!(state.current_track_id(), Some("a"));
    assert_eq!(h.binding.transport_state(), TransportState::Paused);
}

#[tokio::test]
async fn test_library_track_plays_without_resolve() {
    let mut h = Harness::new().with_playlist("p", &["a"]);
    h.binding.play_playlist("p").await.unwrap();
    h.drain();

    let track = LibraryTrack {
        track_id: "lib".into(),
        title: "Library Song".into(),
        artist: "Artist".into(),
        thumbnail_url: String::new(),
        duration_secs: 200.0,
        audio_url: "https://cdn.example.com/lib.m4a".into(),
        created_at: None,
    };
    h.binding.play_library_track(track.clone()).await.unwrap();

    assert_eq!(h.resolver.calls(), vec!["a"]);
    assert!(h.binding.queue().active_playlist_id().is_none());
    assert_eq!(h.output.source().as_deref(), Some("https://cdn.example.com/lib.m4a"));
    assert_eq!(
        h.notifications(),
        vec![(NotificationLevel::Info, "Playing from library".to_string())]
    );

    let outcome = h.binding.play_library_track(track).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Toggled { playing: false });
}

#[tokio::test]
async fn test_play_from_unknown_playlist_fails() {
    let h = Harness::new().with_playlist("p", &["a"]);
    assert!(matches!(
        h.binding.play_from_playlist("missing", 0).await,
        Err(PlaybackError::PlaylistNotFound(_))
    ));
    assert!(matches!(
        h.binding.play_from_playlist("p", 3).await,
        Err(PlaybackError::IndexOutOfRange { len: 1, .. })
    ));
    assert!(h.resolver.calls().is_empty());
}

#[tokio::test]
async fn test_same_url_is_not_reloaded() {
    let h = Harness::new();
    h.binding
        .load_track(descriptor("a", false), core_playback::LoadIntent::Play)
        .await;
    h.binding
        .load_track(descriptor("a", false), core_playback::LoadIntent::Play)
        .await;
    assert_eq!(h.output.source_assignments(), 1);
}

// ============================================================================
// Seek and volume
// ============================================================================

#[tokio::test]
async fn test_seek_ignores_non_finite() {
    let h = Harness::new();
    h.binding.load_and_play(search_track("a")).await.unwrap();

    h.binding.seek(30.0);
    assert_eq!(h.output.position(), 30.0);
    assert_eq!(h.binding.playback().position(), 30.0);

    h.binding.seek(f64::NAN);
    h.binding.seek(f64::INFINITY);
    assert_eq!(h.output.position(), 30.0);
}

#[tokio::test]
async fn test_volume_is_clamped_and_applied() {
    let h = Harness::new();
    assert_eq!(h.binding.set_volume(1.5), 1.0);
    assert_eq!(h.output.volume(), 1.0);
    assert_eq!(h.binding.set_volume(-0.2), 0.0);
    assert_eq!(h.output.volume(), 0.0);
    assert!(h.binding.is_muted());
}

#[tokio::test]
async fn test_mute_restores_previous_volume() {
    let h = Harness::new();
    h.binding.set_volume(0.6);

    assert_eq!(h.binding.toggle_mute(), 0.0);
    assert!(h.binding.is_muted());
    assert_eq!(h.binding.toggle_mute(), 0.6);
    assert_eq!(h.output.volume(), 0.6);
}

// ============================================================================
// Request tokens
// ============================================================================

#[tokio::test]
async fn test_stale_resolve_is_discarded() {
    let h = Harness::new();
    let gate = Arc::new(Notify::new());
    h.resolver.script("slow", Script::Gated(gate.clone()));

    let binding = h.binding.clone();
    let slow = tokio::spawn(async move { binding.load_and_play(search_track("slow")).await });
    let resolver = h.resolver.clone();
    wait_until(|| resolver.calls().len() == 1).await;

    h.binding.load_and_play(search_track("fast")).await.unwrap();
    gate.notify_one();

    let outcome = slow.await.unwrap().unwrap();
    assert_eq!(outcome, PlayOutcome::Superseded);

    let state = h.binding.playback().snapshot();
    assert_eq!(state.current_track_id(), Some("fast"));
    assert!(!state.is_loading);
    let history: Vec<String> = h
        .binding
        .history()
        .tracks()
        .into_iter()
        .map(|t| t.video_id)
        .collect();
    assert_eq!(history, vec!["fast"]);
}

// ============================================================================
// Output events
// ============================================================================

#[tokio::test]
async fn test_output_events_are_mirrored() {
    let h = Harness::new();
    let subscription = h.binding.attach().unwrap();
    assert_eq!(h.output.volume(), 0.8);
    assert!(h.binding.attach().is_err());

    h.output.emit(AudioOutputEvent::TimeUpdate { position: 12.5 });
    h.output.emit(AudioOutputEvent::DurationChanged { duration: f64::INFINITY });
    h.output.emit(AudioOutputEvent::DurationChanged { duration: 200.0 });
    h.output.emit(AudioOutputEvent::Waiting);

    let playback = h.binding.playback().clone();
    wait_until(|| {
        let s = playback.snapshot();
        s.position_secs == 12.5 && s.duration_secs == 200.0 && s.is_loading
    })
    .await;

    h.output.emit(AudioOutputEvent::CanPlay);
    wait_until(|| !playback.is_loading()).await;

    subscription.detach().await;
    h.output.emit(AudioOutputEvent::TimeUpdate { position: 99.0 });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(playback.position(), 12.5);

    // A new subscription is allowed once the old one is gone.
    let _again = h.binding.attach().unwrap();
}

#[tokio::test]
async fn test_dropped_subscription_does_not_double_advance() {
    let h = Harness::new().with_playlist("p", &["a", "b", "c"]);
    h.binding.play_from_playlist("p", 0).await.unwrap();

    let first = h.binding.attach().unwrap();
    drop(first);

    let binding = h.binding.clone();
    let mut second = None;
    for _ in 0..200 {
        if let Ok(subscription) = binding.attach() {
            second = Some(subscription);
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let _second = second.expect("old pump never released the output");

    h.output.emit(AudioOutputEvent::Ended);
    let queue = h.binding.queue().clone();
    wait_until(|| queue.current_index() == Some(1)).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(h.binding.queue().current_index(), Some(1));
    assert_eq!(h.resolver.calls(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_output_fault_stops_playback() {
    let mut h = Harness::new();
    let _subscription = h.binding.attach().unwrap();
    h.binding.load_and_play(search_track("a")).await.unwrap();
    h.drain();

    h.output.emit(AudioOutputEvent::Error {
        message: "decode failed".into(),
    });

    let binding = h.binding.clone();
    wait_until(|| binding.transport_state() == TransportState::Errored).await;
    let state = h.binding.playback().snapshot();
    assert!(!state.is_playing);
    assert!(!state.is_loading);
    assert_eq!(state.current_track_id(), Some("a"));
    assert!(h.drain().iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::Error { recoverable: false, .. })
    )));
}

#[tokio::test]
async fn test_playlist_scenario_runs_to_completion() {
    let mut h = Harness::new().with_playlist("abc", &["A", "B", "C"]);
    let _subscription = h.binding.attach().unwrap();

    h.binding.play_from_playlist("abc", 1).await.unwrap();
    assert_eq!(h.binding.queue().current_index(), Some(1));

    h.binding.skip_next().await;
    assert_eq!(h.binding.queue().current_index(), Some(2));
    assert_eq!(
        h.binding.playback().snapshot().current_track_id(),
        Some("C")
    );
    assert!(h.binding.playback().is_playing());
    h.drain();

    h.output.emit(AudioOutputEvent::Ended);
    let playback = h.binding.playback().clone();
    wait_until(|| !playback.is_playing()).await;

    assert_eq!(h.binding.queue().current_index(), Some(2));
    assert_eq!(h.binding.queue().active_playlist_id().as_deref(), Some("abc"));
    assert_eq!(h.resolver.calls(), vec!["B", "C"]);

    let events = h.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::Completed { track_id }) if track_id == "C"
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::Stopped { .. }))));
}

#[tokio::test]
async fn test_natural_completion_advances() {
    let h = Harness::new().with_playlist("p", &["a", "b"]);
    let _subscription = h.binding.attach().unwrap();
    h.binding.play_playlist("p").await.unwrap();

    h.output.emit(AudioOutputEvent::Ended);

    let queue = h.binding.queue().clone();
    wait_until(|| queue.current_index() == Some(1)).await;
    let playback = h.binding.playback().clone();
    wait_until(|| playback.snapshot().current_track_id() == Some("b")).await;
    assert!(playback.is_playing());
}
