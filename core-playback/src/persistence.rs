//! Best-effort client-local persistence.
//!
//! Two small documents survive restarts: the recently played tracks and the
//! ids of playlists created without an account. Storage failures never reach
//! the caller. They are logged and the in-memory value stays authoritative.

use std::sync::Arc;

use bridge_traits::storage::SettingsStore;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::QueueTrack;

/// Default number of entries kept in the recent history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// JSON accessor over a [`SettingsStore`] that never raises.
#[derive(Clone)]
pub struct LocalStore {
    store: Arc<dyn SettingsStore>,
}

impl LocalStore {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Read and decode `key`. Missing, unreadable and malformed values all
    /// read as `None`.
    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get_string(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                debug!(key, error = %e, "Failed to read local state");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Ignoring malformed local state");
                None
            }
        }
    }

    /// Encode and write `value` under `key`. Returns whether it was stored.
    pub async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode local state");
                return false;
            }
        };
        match self.store.set_string(key, &raw).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to write local state");
                false
            }
        }
    }

    /// Drop `key` from storage. Returns whether it was removed.
    pub async fn remove(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to remove local state");
                false
            }
        }
    }
}

// ============================================================================
// Recent history
// ============================================================================

/// Most-recent-first list of played tracks, de-duplicated by `video_id`.
pub struct RecentHistory {
    local: LocalStore,
    key: String,
    capacity: usize,
    tracks: Mutex<Vec<QueueTrack>>,
}

impl RecentHistory {
    pub fn new(local: LocalStore, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            local,
            key: key.into(),
            capacity: capacity.max(1),
            tracks: Mutex::new(Vec::new()),
        }
    }

    /// Replace the in-memory list with the persisted one, if any.
    pub async fn load(&self) -> Vec<QueueTrack> {
        let mut stored: Vec<QueueTrack> = self.local.read_json(&self.key).await.unwrap_or_default();
        stored.truncate(self.capacity);
        *self.tracks.lock() = stored.clone();
        stored
    }

    pub fn tracks(&self) -> Vec<QueueTrack> {
        self.tracks.lock().clone()
    }

    /// Move `track` to the front, evicting the oldest entry beyond capacity.
    pub async fn push(&self, track: QueueTrack) -> Vec<QueueTrack> {
        let snapshot = {
            let mut tracks = self.tracks.lock();
            tracks.retain(|t| t.video_id != track.video_id);
            tracks.insert(0, track);
            tracks.truncate(self.capacity);
            tracks.clone()
        };
        self.local.write_json(&self.key, &snapshot).await;
        snapshot
    }

    pub async fn clear(&self) {
        self.tracks.lock().clear();
        self.local.remove(&self.key).await;
    }
}

// ============================================================================
// Anonymous playlist ids
// ============================================================================

/// Persisted-store envelope shared with the web client.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Envelope {
    state: PlaylistIdsState,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistIdsState {
    #[serde(default)]
    local_playlist_ids: Vec<String>,
}

/// Ids of playlists created while signed out.
pub struct LocalPlaylistIds {
    local: LocalStore,
    key: String,
    ids: Mutex<Vec<String>>,
}

impl LocalPlaylistIds {
    pub fn new(local: LocalStore, key: impl Into<String>) -> Self {
        Self {
            local,
            key: key.into(),
            ids: Mutex::new(Vec::new()),
        }
    }

    pub async fn load(&self) -> Vec<String> {
        let envelope: Envelope = self.local.read_json(&self.key).await.unwrap_or_default();
        let ids = envelope.state.local_playlist_ids;
        *self.ids.lock() = ids.clone();
        ids
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.lock().clone()
    }

    /// Add `id` unless already present.
    pub async fn add(&self, id: &str) {
        let snapshot = {
            let mut ids = self.ids.lock();
            if ids.iter().any(|existing| existing == id) {
                return;
            }
            ids.push(id.to_string());
            ids.clone()
        };
        self.persist(snapshot).await;
    }

    pub async fn remove(&self, id: &str) {
        let snapshot = {
            let mut ids = self.ids.lock();
            ids.retain(|existing| existing != id);
            ids.clone()
        };
        self.persist(snapshot).await;
    }

    pub async fn clear(&self) {
        self.ids.lock().clear();
        self.persist(Vec::new()).await;
    }

    async fn persist(&self, ids: Vec<String>) {
        let envelope = Envelope {
            state: PlaylistIdsState {
                local_playlist_ids: ids,
            },
            version: 0,
        };
        self.local.write_json(&self.key, &envelope).await;
    }
}
