//! Convenience helpers for wiring all wasm bridge implementations together.
//!
//! Host shells can use [`build_wasm_bridges`] to construct the audio output,
//! HTTP client and settings store in one call. The result mirrors the role
//! that `bridge-desktop` plays for native targets.

use std::sync::Arc;

use bridge_traits::{
    error::Result as BridgeResult, http::HttpClient, playback::AudioOutput,
    storage::SettingsStore,
};

use crate::{audio::HtmlAudioOutput, http::WasmHttpClient, storage::WasmSettingsStore};

/// Configuration for [`build_wasm_bridges`].
#[derive(Debug, Clone, Default)]
pub struct WasmBridgeConfig {
    /// Namespace for settings keys. `None` stores keys verbatim, which keeps
    /// data written by the existing web client readable.
    pub namespace: Option<String>,
}

impl WasmBridgeConfig {
    /// Store settings under `{namespace}::settings::{key}`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    /// Store settings under their plain keys.
    pub fn unscoped() -> Self {
        Self { namespace: None }
    }
}

/// Fully constructed wasm bridge objects ready for injection into the core.
pub struct WasmBridgeSet {
    /// The page's single audio output.
    pub audio_output: Arc<dyn AudioOutput>,
    /// HTTP client powered by browser `fetch`.
    pub http_client: Arc<dyn HttpClient>,
    /// Plain settings store layered on `localStorage`.
    pub settings_store: Arc<dyn SettingsStore>,
}

impl WasmBridgeSet {
    /// Convenience accessor to clone the audio output.
    pub fn audio_output(&self) -> Arc<dyn AudioOutput> {
        Arc::clone(&self.audio_output)
    }

    /// Convenience accessor to clone the HTTP client.
    pub fn http(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http_client)
    }

    /// Convenience accessor to clone the settings store.
    pub fn settings_store(&self) -> Arc<dyn SettingsStore> {
        Arc::clone(&self.settings_store)
    }
}

/// Build the default wasm bridge stack.
///
/// Hosts should call this once during startup and pass the returned trait
/// objects into `core-service`.
pub fn build_wasm_bridges(config: WasmBridgeConfig) -> BridgeResult<WasmBridgeSet> {
    let audio_output: Arc<dyn AudioOutput> = Arc::new(HtmlAudioOutput::new()?);
    let http_client: Arc<dyn HttpClient> = Arc::new(WasmHttpClient::new()?);
    let settings_store: Arc<dyn SettingsStore> = match config.namespace {
        Some(namespace) => Arc::new(WasmSettingsStore::new(namespace)?),
        None => Arc::new(WasmSettingsStore::unscoped()?),
    };

    Ok(WasmBridgeSet {
        audio_output,
        http_client,
        settings_store,
    })
}
