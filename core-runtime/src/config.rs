//! # Core Configuration Module
//!
//! Builder-based configuration for the Peerless player core.
//!
//! ## Required Dependencies
//!
//! - API base URL - where the stream endpoint (`{base}/stream/{id}`) lives
//! - `SettingsStore` - client-local persistence (recent tracks, anonymous playlists)
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - desktop default: reqwest
//!
//! When the `desktop-shims` feature is enabled, a reqwest HTTP client and an
//! SQLite-backed settings store are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, PlaybackSettings};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("https://api.example.com")
//!     .http_client(Arc::new(MyHttpClient))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .playback(PlaybackSettings::default().with_restart_threshold_secs(5.0))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Missing capabilities and out-of-range settings fail at `build()` with an
//! actionable message instead of surfacing later during playback.

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Default storage key for the recently played list.
pub const DEFAULT_RECENT_TRACKS_KEY: &str = "peerless_recent_tracks";

/// Default storage key for the persisted anonymous playlist ids.
pub const DEFAULT_LOCAL_PLAYLISTS_KEY: &str = "peerless-auth";

/// Upper bound accepted for the recent history capacity.
pub const MAX_HISTORY_CAPACITY: usize = 1000;

/// Core configuration for the Peerless player core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Base URL of the player API, without a trailing slash. Empty means
    /// the site root of the page serving the player.
    pub api_base_url: String,

    /// HTTP client for API requests (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Client-local key-value storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Playback coordinator tuning
    pub playback: PlaybackSettings,

    /// Keys used for persisted client state
    pub storage_keys: StorageKeys,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("settings_store", &"SettingsStore { ... }")
            .field("playback", &self.playback)
            .field("storage_keys", &self.storage_keys)
            .finish()
    }
}

/// Tuning knobs for the playback coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    /// Volume applied at startup, `0.0..=1.0`
    pub default_volume: f32,

    /// Elapsed seconds after which "previous" restarts the current track
    /// instead of moving back in the playlist
    pub restart_threshold_secs: f64,

    /// Number of entries kept in the recently played list
    pub history_capacity: usize,

    /// Capacity of the core event bus
    pub event_buffer_size: usize,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_volume: 0.8,
            restart_threshold_secs: 3.0,
            history_capacity: 10,
            event_buffer_size: 100,
        }
    }
}

impl PlaybackSettings {
    pub fn with_default_volume(mut self, volume: f32) -> Self {
        self.default_volume = volume;
        self
    }

    pub fn with_restart_threshold_secs(mut self, secs: f64) -> Self {
        self.restart_threshold_secs = secs;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    /// Validates the playback settings.
    pub fn validate(&self) -> Result<()> {
        if !self.default_volume.is_finite() || !(0.0..=1.0).contains(&self.default_volume) {
            return Err(Error::Config(format!(
                "Default volume must be between 0.0 and 1.0 (got {})",
                self.default_volume
            )));
        }

        if !self.restart_threshold_secs.is_finite() || self.restart_threshold_secs < 0.0 {
            return Err(Error::Config(format!(
                "Restart threshold must be a finite, non-negative number of seconds (got {})",
                self.restart_threshold_secs
            )));
        }

        if self.history_capacity == 0 {
            return Err(Error::Config(
                "History capacity must be greater than 0".to_string(),
            ));
        }

        if self.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(Error::Config(format!(
                "History capacity exceeds maximum of {}",
                MAX_HISTORY_CAPACITY
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Storage keys for persisted client state.
///
/// The defaults match the keys the web client has always written, so
/// existing browser data is picked up unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub recent_tracks: String,
    pub local_playlists: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            recent_tracks: DEFAULT_RECENT_TRACKS_KEY.to_string(),
            local_playlists: DEFAULT_LOCAL_PLAYLISTS_KEY.to_string(),
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// URL of the stream endpoint for a track.
    pub fn stream_url(&self, track_id: &str) -> String {
        format!("{}/stream/{}", self.api_base_url, track_id)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - API base URL is absolute http(s), root-relative, or the site root
    /// - Playback settings are in range
    /// - Storage keys are not empty
    pub fn validate(&self) -> Result<()> {
        if !self.api_base_url.is_empty() {
            validate_base_url(&self.api_base_url)?;
        }
        self.playback.validate()?;

        if self.storage_keys.recent_tracks.is_empty()
            || self.storage_keys.local_playlists.is_empty()
        {
            return Err(Error::Config("Storage keys cannot be empty".to_string()));
        }

        if self.storage_keys.recent_tracks == self.storage_keys.local_playlists {
            return Err(Error::Config(
                "Recent tracks and local playlists must use different storage keys".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_base_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::Config("API base URL cannot be empty".to_string()));
    }

    let absolute = url.starts_with("http://") || url.starts_with("https://");
    if !absolute && !url.starts_with('/') {
        return Err(Error::Config(format!(
            "API base URL must start with http://, https:// or '/' (got '{}')",
            url
        )));
    }

    Ok(())
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for recent tracks and local playlists. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteSettingsStore. \
                 Web: inject bridge_wasm::WasmSettingsStore (localStorage)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(Some(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(settings_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let path = settings_path.unwrap_or_else(|| std::env::temp_dir().join("peerless-settings.db"));

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Tokio worker thread panicked while creating default SettingsStore"
                        .to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(
    _settings_path: Option<PathBuf>,
) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    settings_path: Option<PathBuf>,
    playback: PlaybackSettings,
    storage_keys: StorageKeys,
}

impl CoreConfigBuilder {
    /// Sets the API base URL (`https://host/api` or a root-relative `/api`).
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Location of the default SQLite settings database (desktop shims only).
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn playback(mut self, settings: PlaybackSettings) -> Self {
        self.playback = settings;
        self
    }

    pub fn recent_tracks_key(mut self, key: impl Into<String>) -> Self {
        self.storage_keys.recent_tracks = key.into();
        self
    }

    pub fn local_playlists_key(mut self, key: impl Into<String>) -> Self {
        self.storage_keys.local_playlists = key.into();
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the base URL is missing or any setting is invalid
    /// - `Error::CapabilityMissing` if no settings store is available
    pub fn build(self) -> Result<CoreConfig> {
        let api_base_url = self.api_base_url.ok_or_else(|| {
            Error::Config(
                "API base URL is required. Use .api_base_url() to set it.".to_string(),
            )
        })?;
        validate_base_url(api_base_url.trim())?;

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None => provide_default_http_client()?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_path)?,
        };

        let config = CoreConfig {
            api_base_url: normalize_base_url(&api_base_url),
            http_client,
            settings_store,
            playback: self.playback,
            storage_keys: self.storage_keys,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;

    struct MockSettingsStore;

    #[async_trait::async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }
        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }
        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder().settings_store(Arc::new(MockSettingsStore))
    }

    #[test]
    fn test_builder_with_defaults() {
        let config = builder()
            .api_base_url("https://api.example.com/")
            .build()
            .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.playback, PlaybackSettings::default());
        assert_eq!(config.storage_keys.recent_tracks, "peerless_recent_tracks");
        assert_eq!(config.storage_keys.local_playlists, "peerless-auth");
        assert_eq!(
            config.stream_url("abc"),
            "https://api.example.com/stream/abc"
        );
    }

    #[test]
    fn test_root_relative_base_url() {
        let config = builder().api_base_url("/").build().unwrap();
        assert_eq!(config.stream_url("xyz"), "/stream/xyz");

        let config = builder().api_base_url("/api/").build().unwrap();
        assert_eq!(config.stream_url("xyz"), "/api/stream/xyz");
    }

    #[test]
    fn test_missing_base_url() {
        let err = builder().build().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("api_base_url")));
    }

    #[test]
    fn test_rejects_bare_host() {
        let err = builder()
            .api_base_url("api.example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_settings_store() {
        let err = CoreConfig::builder()
            .api_base_url("https://api.example.com")
            .build()
            .unwrap_err();

        match err {
            Error::CapabilityMissing { capability, .. } => assert_eq!(capability, "SettingsStore"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_playback_settings_validation() {
        assert!(PlaybackSettings::default().validate().is_ok());
        assert!(PlaybackSettings::default()
            .with_default_volume(1.2)
            .validate()
            .is_err());
        assert!(PlaybackSettings::default()
            .with_default_volume(f32::NAN)
            .validate()
            .is_err());
        assert!(PlaybackSettings::default()
            .with_restart_threshold_secs(-1.0)
            .validate()
            .is_err());
        assert!(PlaybackSettings::default()
            .with_restart_threshold_secs(f64::INFINITY)
            .validate()
            .is_err());
        assert!(PlaybackSettings::default()
            .with_history_capacity(0)
            .validate()
            .is_err());
        assert!(PlaybackSettings::default()
            .with_history_capacity(MAX_HISTORY_CAPACITY + 1)
            .validate()
            .is_err());
        assert!(PlaybackSettings::default()
            .with_event_buffer_size(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_custom_storage_keys_must_differ() {
        let err = builder()
            .api_base_url("https://api.example.com")
            .recent_tracks_key("same")
            .local_playlists_key("same")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = builder()
            .api_base_url("https://api.example.com")
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("SettingsStore { ... }"));
        assert!(debug.contains("https://api.example.com"));
    }
}
