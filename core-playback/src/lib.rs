//! # Playback Coordination
//!
//! Client-side playback and queue coordination for the player.
//!
//! ## Overview
//!
//! This crate handles:
//! - The data model shared with the remote API (`models`)
//! - Observable playback and queue state (`state`, `queue`)
//! - Track resolution against the remote stream endpoint (`resolver`)
//! - The audio engine binding that keeps the single output in sync with the
//!   stores and drives auto-advance (`engine`)
//! - Best-effort persistence of recent tracks and anonymous playlist ids
//!   (`persistence`)

pub mod engine;
pub mod error;
pub mod format;
pub mod models;
pub mod persistence;
pub mod queue;
pub mod resolver;
pub mod state;

pub use engine::{
    AudioEngineBinding, BindingDependencies, EventSubscription, LoadIntent, PlayOutcome,
    TransportState,
};
pub use error::{PlaybackError, Result};
pub use models::{LibraryTrack, Playlist, QueueTrack, StreamDescriptor};
pub use persistence::{LocalPlaylistIds, LocalStore, RecentHistory};
pub use queue::{NavigationState, QueueState, QueueStore};
pub use resolver::{HttpTrackResolver, TrackResolver};
pub use state::{PlaybackState, PlaybackStore};
