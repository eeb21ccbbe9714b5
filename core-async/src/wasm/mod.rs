//! Browser-side task support.
//!
//! Everything runs on the page's single thread; spawned futures are handed to
//! `wasm_bindgen_futures::spawn_local` and report back through a oneshot.

pub mod task;
