//! # Playback Error Types
//!
//! Errors raised while resolving and playing tracks.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// The remote service accepted the request but the stream is still being
    /// prepared (HTTP 202). Retrying shortly is expected to succeed.
    #[error("Track {0} is being processed. Please try again shortly.")]
    NotReady(String),

    /// The remote service does not know the track.
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// The remote service answered with an unexpected status.
    #[error("Failed to load track {track_id} (HTTP {status})")]
    ResolveFailed { track_id: String, status: u16 },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] BridgeError),

    /// The response body could not be decoded as a stream descriptor.
    #[error("Invalid stream response: {0}")]
    InvalidResponse(String),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// The audio output rejected an operation.
    #[error("Playback operation failed: {0}")]
    PlaybackFailed(String),

    /// No playlist with the given id is known.
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    /// The requested index is outside the playlist.
    #[error("Index {index} out of range for playlist {playlist_id} ({len} tracks)")]
    IndexOutOfRange {
        playlist_id: String,
        index: usize,
        len: usize,
    },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Client-local state could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if repeating the same request is expected to succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlaybackError::NotReady(_))
    }

    /// Returns `true` if this error is due to network or server issues.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::Network(_) | PlaybackError::ResolveFailed { .. }
        )
    }

    /// Message suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::NotReady(_) => {
                "Track is being processed. Please try again shortly.".to_string()
            }
            PlaybackError::TrackNotFound(_)
            | PlaybackError::ResolveFailed { .. }
            | PlaybackError::Network(_)
            | PlaybackError::InvalidResponse(_) => "Failed to load track".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_ready_is_retryable() {
        assert!(PlaybackError::NotReady("abc".into()).is_retryable());
        assert!(!PlaybackError::TrackNotFound("abc".into()).is_retryable());
        assert!(!PlaybackError::ResolveFailed {
            track_id: "abc".into(),
            status: 500
        }
        .is_retryable());
        assert!(!PlaybackError::Network(BridgeError::OperationFailed("reset".into())).is_retryable());
    }

    #[test]
    fn user_messages_distinguish_not_ready() {
        let not_ready = PlaybackError::NotReady("abc".into()).user_message();
        let failed = PlaybackError::TrackNotFound("abc".into()).user_message();
        assert!(not_ready.contains("try again"));
        assert_eq!(failed, "Failed to load track");
    }

    #[test]
    fn bridge_errors_convert() {
        let err: PlaybackError = BridgeError::NotAvailable("fetch".into()).into();
        assert!(err.is_network_error());
    }
}
