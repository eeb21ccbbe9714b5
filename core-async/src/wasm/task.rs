//! WASM-specific task spawning.
//!
//! `spawn` returns an awaitable `JoinHandle`, matching the Tokio API surface so
//! callers can treat both targets the same way.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Error returned when a spawned task never produced a value.
#[derive(Debug, Clone)]
pub struct JoinError;

impl JoinError {
    /// Returns true if the task was dropped before completing.
    pub fn is_cancelled(&self) -> bool {
        true
    }
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task was cancelled")
    }
}

impl std::error::Error for JoinError {}

/// Handle to a task spawned on the page event loop.
///
/// Dropping the handle detaches the task. `abort` is a no-op: once handed to
/// `spawn_local` a future runs until it completes.
pub struct JoinHandle<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> JoinHandle<T> {
    /// No-op on WASM.
    pub fn abort(&self) {}
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| JoinError))
    }
}

/// Spawns a future onto the browser event loop.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let (sender, receiver) = oneshot::channel();
    wasm_bindgen_futures::spawn_local(async move {
        let output = future.await;
        let _ = sender.send(output);
    });
    JoinHandle { receiver }
}

/// Yields back to the event loop with a zero-delay timeout.
pub async fn yield_now() {
    gloo_timers::future::TimeoutFuture::new(0).await;
}
