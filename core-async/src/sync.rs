//! Synchronization primitives.
//!
//! Tokio's `sync` module has no runtime dependency, so the same channel types
//! are used on every target:
//!
//! - `watch`: latest-value state snapshots (playback and queue stores)
//! - `broadcast`: fan-out of transient events (audio output, core event bus)
//! - `oneshot`: shutdown signals for background pumps

pub use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, RwLock};
