//! Error types for WebAssembly bridge implementations

use thiserror::Error;
use wasm_bindgen::JsCast;

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug)]
pub enum WasmError {
    /// JavaScript error from web-sys
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// The media element reported a failure
    #[error("Media error: {0}")]
    Media(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unsupported operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl From<WasmError> for bridge_traits::error::BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::Unsupported(what) => bridge_traits::error::BridgeError::NotAvailable(what),
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}

impl From<wasm_bindgen::JsValue> for WasmError {
    fn from(js_value: wasm_bindgen::JsValue) -> Self {
        WasmError::JavaScript(js_message(&js_value))
    }
}

/// Best-effort human readable text for a thrown JavaScript value.
pub(crate) fn js_message(js_value: &wasm_bindgen::JsValue) -> String {
    if js_value.is_string() {
        js_value
            .as_string()
            .unwrap_or_else(|| "Unknown error".to_string())
    } else if let Some(error) = js_value.dyn_ref::<js_sys::Error>() {
        error.message().into()
    } else {
        format!("{:?}", js_value)
    }
}
