//! `localStorage` implementation of the settings storage bridge.
//!
//! Two key layouts are supported:
//! - namespaced: every key is stored as `{namespace}::settings::{key}` so
//!   several host shells can share one origin;
//! - unscoped: keys are used verbatim. This is how the existing web client
//!   stores `peerless_recent_tracks` and `peerless-auth`, so data written
//!   before the switch is picked up as-is.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    storage::SettingsStore,
};
use wasm_bindgen::JsValue;

use crate::error::js_message;

const SETTINGS_PREFIX: &str = "settings";

fn js_error(context: &str, err: JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("wasm storage {context}: {}", js_message(&err)))
}

fn local_storage() -> BridgeResult<web_sys::Storage> {
    let window = web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".into()))?;
    window
        .local_storage()
        .map_err(|err| js_error("localStorage", err))?
        .ok_or_else(|| BridgeError::NotAvailable("localStorage".into()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyLayout {
    Namespaced(String),
    Verbatim,
}

impl KeyLayout {
    fn key_for(&self, key: &str) -> String {
        match self {
            KeyLayout::Namespaced(namespace) => format!("{namespace}::{SETTINGS_PREFIX}::{key}"),
            KeyLayout::Verbatim => key.to_string(),
        }
    }
}

#[derive(Clone)]
/// Browser-backed settings store (plain-text key/value pairs).
pub struct WasmSettingsStore {
    storage: web_sys::Storage,
    layout: KeyLayout,
}

impl WasmSettingsStore {
    /// Construct a new settings store scoped to the provided namespace.
    pub fn new(namespace: impl Into<String>) -> BridgeResult<Self> {
        Ok(Self {
            storage: local_storage()?,
            layout: KeyLayout::Namespaced(namespace.into()),
        })
    }

    /// Construct a settings store that reads and writes keys verbatim.
    pub fn unscoped() -> BridgeResult<Self> {
        Ok(Self {
            storage: local_storage()?,
            layout: KeyLayout::Verbatim,
        })
    }

    fn key_for(&self, key: &str) -> String {
        self.layout.key_for(key)
    }
}

#[async_trait(?Send)]
impl SettingsStore for WasmSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.storage
            .set_item(&self.key_for(key), value)
            .map_err(|err| js_error("set setting", err))
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        self.storage
            .get_item(&self.key_for(key))
            .map_err(|err| js_error("get setting", err))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.storage
            .remove_item(&self.key_for(key))
            .map_err(|err| js_error("remove setting", err))
    }
}
