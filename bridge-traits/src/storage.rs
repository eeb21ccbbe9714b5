//! Key-value settings storage.
//!
//! The player persists two small pieces of client-local state (recently
//! played tracks and anonymously created playlist ids). Both are JSON
//! documents stored under fixed keys, so the contract is a plain string
//! key-value store:
//! - Desktop: SQLite table (`bridge-desktop`)
//! - Web: `localStorage` (`bridge-wasm`)

use crate::{error::Result, platform::PlatformSendSync};

/// Key-value settings storage trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember(store: &dyn SettingsStore, json: &str) -> Result<()> {
///     store.set_string("peerless_recent_tracks", json).await
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SettingsStore: PlatformSendSync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
