//! Core service façade and bootstrap helpers.
//!
//! This crate is the player's application context. It takes the validated
//! [`CoreConfig`](core_runtime::config::CoreConfig) plus the host's audio
//! output, builds the playback and queue stores around a single
//! [`AudioEngineBinding`](core_playback::AudioEngineBinding), and exposes the
//! operations presentation code calls. Desktop hosts typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`), whereas
//! WebAssembly builds enable the `wasm` feature and rely on the adapters from
//! `bridge-wasm`.

pub mod error;
mod service;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;

pub use error::{CoreError, Result};
pub use service::{CoreDependencies, CoreService};

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use bridge_wasm::WasmBridgeConfig;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
use bridge_wasm::{build_wasm_bridges, WasmBridgeSet};

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
impl From<WasmBridgeSet> for CoreDependencies {
    fn from(set: WasmBridgeSet) -> Self {
        Self::new(set.audio_output)
    }
}

/// Convenience bootstrapper for WebAssembly hosts.
///
/// Builds the browser bridges, wires the service against `api_base_url` and
/// starts it.
///
/// ```ignore
/// use core_service::{bootstrap_wasm, WasmBridgeConfig};
///
/// let core = bootstrap_wasm(WasmBridgeConfig::unscoped(), "/api").await?;
/// core.load_and_play(track).await?;
/// ```
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub async fn bootstrap_wasm(config: WasmBridgeConfig, api_base_url: &str) -> Result<CoreService> {
    use core_runtime::config::CoreConfig;

    let bridges = build_wasm_bridges(config)
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let core_config = CoreConfig::builder()
        .api_base_url(api_base_url)
        .http_client(bridges.http())
        .settings_store(bridges.settings_store())
        .build()?;

    let service = CoreService::new(core_config, CoreDependencies::from(bridges))?;
    service.start().await?;
    Ok(service)
}
