//! Data model shared by the stores, the resolver and the engine binding.
//!
//! Field names on the wire follow the remote API (`snake_case` for tracks,
//! `camelCase` for playlists); Rust names are descriptive.

use serde::{Deserialize, Serialize};

/// A playable stream returned by the remote track service.
///
/// Immutable once received. Loading a new track replaces the previous
/// descriptor wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,
    #[serde(rename = "duration", default)]
    pub duration_secs: f64,
    pub audio_url: String,
    /// Informational only; drives notification text.
    #[serde(rename = "cached", default)]
    pub served_from_cache: bool,
}

/// Reference to a track inside playlists and recent history.
///
/// Must be resolved into a [`StreamDescriptor`] before it can be played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTrack {
    pub video_id: String,
    pub title: String,
    pub artist: String,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,
    #[serde(rename = "duration", default)]
    pub duration_secs: f64,
}

impl QueueTrack {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail_url: String::new(),
            duration_secs: 0.0,
        }
    }

    /// Whether this reference points at the track described by `current`.
    ///
    /// Search results and stream descriptors do not always agree on ids, so
    /// an exact title and artist match also counts.
    pub fn is_same_track(&self, current: &StreamDescriptor) -> bool {
        current.track_id == self.video_id
            || (current.title == self.title && current.artist == self.artist)
    }
}

/// An already-resolved entry from the server library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryTrack {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,
    #[serde(rename = "duration", default)]
    pub duration_secs: f64,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&LibraryTrack> for StreamDescriptor {
    fn from(track: &LibraryTrack) -> Self {
        StreamDescriptor {
            track_id: track.track_id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            thumbnail_url: track.thumbnail_url.clone(),
            duration_secs: track.duration_secs,
            audio_url: track.audio_url.clone(),
            served_from_cache: true,
        }
    }
}

/// An ordered collection of tracks. Order is playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tracks: Vec<QueueTrack>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Playlist {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tracks: Vec<QueueTrack>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tracks,
            created_at: String::new(),
            updated_at: String::new(),
            cover_image: None,
            user_id: None,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, index: usize) -> Option<&QueueTrack> {
        self.tracks.get(index)
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.tracks.iter().any(|t| t.video_id == video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_descriptor_uses_api_field_names() {
        let json = r#"{
            "track_id": "abc",
            "title": "Song",
            "artist": "Band",
            "thumbnail": "https://img/abc.jpg",
            "duration": 215,
            "audio_url": "https://cdn/abc.m4a",
            "cached": true
        }"#;
        let descriptor: StreamDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.track_id, "abc");
        assert_eq!(descriptor.audio_url, "https://cdn/abc.m4a");
        assert_eq!(descriptor.duration_secs, 215.0);
        assert!(descriptor.served_from_cache);

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["track_id"], "abc");
        assert_eq!(value["audio_url"], "https://cdn/abc.m4a");
        assert_eq!(value["thumbnail"], "https://img/abc.jpg");
    }

    #[test]
    fn queue_track_duration_defaults_to_zero() {
        let track: QueueTrack =
            serde_json::from_str(r#"{"video_id":"v1","title":"T","artist":"A","thumbnail":""}"#)
                .unwrap();
        assert_eq!(track.duration_secs, 0.0);
    }

    #[test]
    fn playlist_reads_camel_case_metadata() {
        let json = r#"{
            "id": "p1",
            "name": "Mix",
            "tracks": [{"video_id":"v1","title":"T","artist":"A","thumbnail":"","duration":10}],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
            "coverImage": "https://img/cover.jpg"
        }"#;
        let playlist: Playlist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist.cover_image.as_deref(), Some("https://img/cover.jpg"));
        assert!(playlist.user_id.is_none());
        assert!(playlist.contains("v1"));
    }

    #[test]
    fn library_tracks_convert_as_cached() {
        let track = LibraryTrack {
            track_id: "lib".into(),
            title: "T".into(),
            artist: "A".into(),
            thumbnail_url: String::new(),
            duration_secs: 3.0,
            audio_url: "https://cdn/lib.m4a".into(),
            created_at: None,
        };
        let descriptor = StreamDescriptor::from(&track);
        assert!(descriptor.served_from_cache);
        assert_eq!(descriptor.audio_url, track.audio_url);
    }

    #[test]
    fn same_track_matches_by_id_or_title_and_artist() {
        let current = StreamDescriptor {
            track_id: "abc".into(),
            title: "Song".into(),
            artist: "Band".into(),
            thumbnail_url: String::new(),
            duration_secs: 0.0,
            audio_url: "u".into(),
            served_from_cache: false,
        };
        assert!(QueueTrack::new("abc", "Other", "Other").is_same_track(&current));
        assert!(QueueTrack::new("xyz", "Song", "Band").is_same_track(&current));
        assert!(!QueueTrack::new("xyz", "Song", "Other").is_same_track(&current));
    }
}
