//! WebAssembly Bridge Implementations
//!
//! This crate provides browser implementations of the bridge traits defined
//! in `bridge-traits`, built on `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It will not compile for native targets.
//!
//! # Implementations
//!
//! - `HtmlAudioOutput`: the page's single `HTMLAudioElement`
//! - `WasmHttpClient`: `fetch` with `AbortController` timeouts
//! - `WasmSettingsStore`: `localStorage`, namespaced or verbatim keys
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{build_wasm_bridges, WasmBridgeConfig};
//!
//! let bridges = build_wasm_bridges(WasmBridgeConfig::unscoped())?;
//! let output = bridges.audio_output();
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod audio;
pub mod bootstrap;
pub mod error;
pub mod http;
pub mod storage;

// Re-export commonly used types
pub use audio::HtmlAudioOutput;
pub use bootstrap::{build_wasm_bridges, WasmBridgeConfig, WasmBridgeSet};
pub use error::{WasmError, WasmResult};
pub use http::WasmHttpClient;
pub use storage::WasmSettingsStore;
