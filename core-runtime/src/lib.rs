//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Peerless player core:
//! - Logging and tracing setup
//! - Configuration builder with fail-fast validation
//! - Event bus for playback, queue and notification events

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use error::{Error, Result};
