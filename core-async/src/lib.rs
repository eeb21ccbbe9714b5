//! Runtime-agnostic async helpers for the Peerless player core.
//!
//! The player runs in two very different hosts:
//! - Native (desktop tools, tests): Tokio multi-threaded runtime
//! - WebAssembly (the browser page): the page event loop via `wasm-bindgen-futures`
//!
//! Downstream crates spawn background work through [`task::spawn`] and use the
//! channel types re-exported from [`sync`] so the same code compiles for both.
//!
//! # Modules
//!
//! - `task`: Task spawning and cooperative yielding
//! - `sync`: Channels used for state fan-out (`watch`, `broadcast`, `oneshot`)
//!
//! # Examples
//!
//! ```rust,ignore
//! use core_async::{sync::oneshot, task};
//!
//! async fn example() {
//!     let (tx, rx) = oneshot::channel::<()>();
//!     let handle = task::spawn(async move {
//!         let _ = rx.await;
//!         "stopped"
//!     });
//!     let _ = tx.send(());
//!     assert_eq!(handle.await.unwrap(), "stopped");
//! }
//! ```

pub mod sync;
pub mod task;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use task::spawn;
