//! Task spawning abstractions.
//!
//! - On native platforms: `tokio::task::spawn`
//! - On WASM: `wasm_bindgen_futures::spawn_local` with an awaitable `JoinHandle`
//!
//! Native tasks must be `Send`; browser tasks only need to be `'static`.

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::task::{yield_now, JoinError, JoinHandle};

#[cfg(not(target_arch = "wasm32"))]
/// Spawns a new asynchronous task on the Tokio runtime.
///
/// Must be called from within a runtime context.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

// ============================================================================
// WASM Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use crate::wasm::task::{spawn, yield_now, JoinError, JoinHandle};

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
