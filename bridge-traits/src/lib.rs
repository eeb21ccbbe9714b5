//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host (browser, desktop) implements
//! for the Peerless player core.
//!
//! ## Traits
//!
//! - [`AudioOutput`](playback::AudioOutput) - The single shared audio output device
//! - [`HttpClient`](http::HttpClient) - Request/response access to the player API
//! - [`SettingsStore`](storage::SettingsStore) - Client-local key-value persistence
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Web      | `bridge-wasm`       |
//! | Desktop  | `bridge-desktop`    |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it with enough context to act on.
//!
//! ## Thread Safety
//!
//! Traits require `Send + Sync` on native targets through
//! [`PlatformSendSync`](platform::PlatformSendSync); the bound disappears on
//! `wasm32`, where browser handles are single-threaded.

pub mod error;
pub mod http;
pub mod logging;
pub mod platform;
pub mod playback;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use playback::{AudioOutput, AudioOutputEvent};
pub use storage::SettingsStore;
