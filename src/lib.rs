//! Workspace entry crate.
//!
//! Exposes the feature flags that map onto `core-service` so host
//! applications can depend on `peerless-workspace` and pick a platform
//! without wiring each crate individually:
//! - `desktop-shims` (default): reqwest HTTP client and SQLite settings store
//! - `wasm`: browser bridges and the `JsPlayer` bindings

#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_service::*;
