//! WASM bindings for core-runtime
//!
//! Exposes logging setup and event consumption to the JavaScript page.

use crate::events::{CoreEvent, Receiver};
use crate::logging::{init_logging, LoggingConfig};
use bridge_traits::logging::LogLevel;
use wasm_bindgen::prelude::*;

pub(crate) fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// JavaScript-accessible logging configuration
#[wasm_bindgen]
#[derive(Clone, Default)]
pub struct JsLoggingConfig {
    inner: LoggingConfig,
}

#[wasm_bindgen]
impl JsLoggingConfig {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum log level (0 = Trace, 1 = Debug, 2 = Info, 3 = Warn, 4 = Error)
    #[wasm_bindgen(js_name = setLevel)]
    pub fn set_level(&mut self, level: u8) {
        self.inner.level = match level {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Info,
        };
    }

    #[wasm_bindgen(js_name = setRedactPii)]
    pub fn set_redact_pii(&mut self, redact: bool) {
        self.inner.redact_pii = redact;
    }
}

/// Initialize console logging
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging_js(config: JsLoggingConfig) -> Result<(), JsValue> {
    init_logging(config.inner).map_err(to_js_error)
}

/// Event receiver handed to the page; each event arrives as a JSON string.
#[wasm_bindgen]
pub struct JsEventReceiver {
    receiver: Receiver<CoreEvent>,
}

impl JsEventReceiver {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self { receiver }
    }
}

#[wasm_bindgen]
impl JsEventReceiver {
    /// Wait for the next event.
    pub async fn recv(&mut self) -> Result<String, JsValue> {
        let event = self.receiver.recv().await.map_err(to_js_error)?;
        serde_json::to_string(&event).map_err(to_js_error)
    }

    /// Returns the next buffered event, or `undefined` when none is pending.
    #[wasm_bindgen(js_name = tryRecv)]
    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver
            .try_recv()
            .ok()
            .and_then(|event| serde_json::to_string(&event).ok())
    }
}
