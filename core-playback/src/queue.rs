//! Queue and playlist store.
//!
//! Holds the known playlists and the navigation position inside the active
//! one. Lookups are pure; mutations notify `watch` subscribers.

use core_async::sync::watch;
use serde::{Deserialize, Serialize};

use crate::models::{Playlist, QueueTrack};

/// Which playlist drives skip and auto-advance, and where in it we are.
///
/// `current_index` is only meaningful while `active_playlist_id` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub active_playlist_id: Option<String>,
    pub current_index: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueState {
    pub playlists: Vec<Playlist>,
    pub navigation: NavigationState,
}

impl QueueState {
    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    pub fn active_playlist(&self) -> Option<&Playlist> {
        self.navigation
            .active_playlist_id
            .as_deref()
            .and_then(|id| self.playlist(id))
    }

    fn next_index(&self) -> Option<usize> {
        let playlist = self.active_playlist()?;
        let next = self.navigation.current_index.map_or(0, |i| i + 1);
        (next < playlist.len()).then_some(next)
    }

    fn previous_index(&self) -> Option<usize> {
        self.active_playlist().filter(|p| !p.is_empty())?;
        self.navigation.current_index?.checked_sub(1)
    }
}

#[derive(Debug)]
pub struct QueueStore {
    state: watch::Sender<QueueState>,
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(QueueState::default());
        Self { state }
    }

    pub fn snapshot(&self) -> QueueState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueueState> {
        self.state.subscribe()
    }

    pub fn navigation(&self) -> NavigationState {
        self.state.borrow().navigation.clone()
    }

    pub fn active_playlist_id(&self) -> Option<String> {
        self.state.borrow().navigation.active_playlist_id.clone()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.borrow().navigation.current_index
    }

    pub fn playlists(&self) -> Vec<Playlist> {
        self.state.borrow().playlists.clone()
    }

    pub fn get_playlist(&self, id: &str) -> Option<Playlist> {
        self.state.borrow().playlist(id).cloned()
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Select the active playlist. Selecting resets the index to 0, clearing
    /// resets it to none.
    pub fn set_active_playlist(&self, id: Option<String>) {
        self.state.send_modify(|s| {
            s.navigation.current_index = id.as_ref().map(|_| 0);
            s.navigation.active_playlist_id = id;
        });
    }

    pub fn set_current_index(&self, index: usize) {
        self.state.send_if_modified(|s| {
            let changed = s.navigation.current_index != Some(index);
            s.navigation.current_index = Some(index);
            changed
        });
    }

    /// Track after the current one in the active playlist, with its index.
    ///
    /// `None` when nothing is active, the playlist is missing or empty, or the
    /// current track is the last one. There is no wraparound.
    pub fn get_next_track(&self) -> Option<(usize, QueueTrack)> {
        let state = self.state.borrow();
        let index = state.next_index()?;
        let track = state.active_playlist()?.track(index)?.clone();
        Some((index, track))
    }

    /// Track before the current one in the active playlist, with its index.
    pub fn get_previous_track(&self) -> Option<(usize, QueueTrack)> {
        let state = self.state.borrow();
        let index = state.previous_index()?;
        let track = state.active_playlist()?.track(index)?.clone();
        Some((index, track))
    }

    pub fn is_track_in_playlist(&self, playlist_id: &str, video_id: &str) -> bool {
        self.state
            .borrow()
            .playlist(playlist_id)
            .is_some_and(|p| p.contains(video_id))
    }

    // ------------------------------------------------------------------------
    // Playlist set
    // ------------------------------------------------------------------------

    pub fn set_playlists(&self, playlists: Vec<Playlist>) {
        self.state.send_modify(|s| s.playlists = playlists);
    }

    /// Replace the playlist with the same id, or append it.
    pub fn upsert_playlist(&self, playlist: Playlist) {
        self.state.send_modify(|s| {
            match s.playlists.iter_mut().find(|p| p.id == playlist.id) {
                Some(existing) => *existing = playlist,
                None => s.playlists.push(playlist),
            }
        });
    }

    /// Remove a playlist, deactivating it if it was active.
    ///
    /// Returns whether a playlist was removed.
    pub fn remove_playlist(&self, id: &str) -> bool {
        let mut removed = false;
        self.state.send_if_modified(|s| {
            let before = s.playlists.len();
            s.playlists.retain(|p| p.id != id);
            removed = s.playlists.len() != before;
            if s.navigation.active_playlist_id.as_deref() == Some(id) {
                s.navigation = NavigationState::default();
                return true;
            }
            removed
        });
        removed
    }

    /// Forget every playlist and reset navigation.
    pub fn clear(&self) {
        self.state.send_replace(QueueState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(id: &str, ids: &[&str]) -> Playlist {
        let tracks = ids
            .iter()
            .map(|v| QueueTrack::new(*v, format!("Title {v}"), "Artist"))
            .collect();
        Playlist::new(id, format!("Playlist {id}"), tracks)
    }

    fn store_with(playlists: Vec<Playlist>) -> QueueStore {
        let store = QueueStore::new();
        store.set_playlists(playlists);
        store
    }

    #[test]
    fn selecting_resets_index() {
        let store = store_with(vec![playlist("p1", &["a", "b"])]);
        store.set_active_playlist(Some("p1".into()));
        store.set_current_index(1);
        store.set_active_playlist(Some("p1".into()));
        assert_eq!(store.current_index(), Some(0));

        store.set_active_playlist(None);
        assert_eq!(store.navigation(), NavigationState::default());
    }

    #[test]
    fn next_track_stops_at_end() {
        let store = store_with(vec![playlist("p1", &["a", "b", "c"])]);
        store.set_active_playlist(Some("p1".into()));

        let (index, track) = store.get_next_track().unwrap();
        assert_eq!(index, 1);
        assert_eq!(track.video_id, "b");

        store.set_current_index(2);
        assert!(store.get_next_track().is_none());
    }

    #[test]
    fn previous_track_stops_at_start() {
        let store = store_with(vec![playlist("p1", &["a", "b"])]);
        store.set_active_playlist(Some("p1".into()));
        assert!(store.get_previous_track().is_none());

        store.set_current_index(1);
        let (index, track) = store.get_previous_track().unwrap();
        assert_eq!(index, 0);
        assert_eq!(track.video_id, "a");
    }

    #[test]
    fn lookups_without_active_playlist() {
        let store = store_with(vec![playlist("p1", &["a"]), playlist("empty", &[])]);
        assert!(store.get_next_track().is_none());
        assert!(store.get_previous_track().is_none());

        store.set_active_playlist(Some("missing".into()));
        assert!(store.get_next_track().is_none());

        store.set_active_playlist(Some("empty".into()));
        assert!(store.get_next_track().is_none());
        assert!(store.get_previous_track().is_none());
    }

    #[test]
    fn membership() {
        let store = store_with(vec![playlist("p1", &["a"])]);
        assert!(store.is_track_in_playlist("p1", "a"));
        assert!(!store.is_track_in_playlist("p1", "z"));
        assert!(!store.is_track_in_playlist("missing", "a"));
    }

    #[test]
    fn upsert_replaces_or_appends() {
        let store = store_with(vec![playlist("p1", &["a"])]);
        store.upsert_playlist(playlist("p1", &["a", "b"]));
        store.upsert_playlist(playlist("p2", &[]));

        assert_eq!(store.playlists().len(), 2);
        assert_eq!(store.get_playlist("p1").unwrap().len(), 2);
    }

    #[test]
    fn removing_active_playlist_clears_navigation() {
        let store = store_with(vec![playlist("p1", &["a"]), playlist("p2", &["b"])]);
        store.set_active_playlist(Some("p1".into()));

        assert!(store.remove_playlist("p2"));
        assert_eq!(store.active_playlist_id().as_deref(), Some("p1"));

        assert!(store.remove_playlist("p1"));
        assert!(store.active_playlist_id().is_none());
        assert!(store.current_index().is_none());
        assert!(!store.remove_playlist("p1"));
    }

    #[test]
    fn clear_resets_everything() {
        let store = store_with(vec![playlist("p1", &["a"])]);
        store.set_active_playlist(Some("p1".into()));
        store.clear();
        assert_eq!(store.snapshot(), QueueState::default());
    }
}
