//! Remote track resolution.
//!
//! The remote track service turns a track id into a playable
//! [`StreamDescriptor`]. The coordinator only depends on [`TrackResolver`];
//! [`HttpTrackResolver`] talks to the `GET {api}/stream/{id}` endpoint.

use std::sync::Arc;

use bridge_traits::{
    http::{HttpClient, HttpRequest},
    platform::PlatformSendSync,
};
use tracing::{debug, instrument};

use crate::{
    error::{PlaybackError, Result},
    models::StreamDescriptor,
};

/// Resolves track ids into playable stream descriptors.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait TrackResolver: PlatformSendSync {
    /// Resolve `track_id`.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::NotReady`] while the service is still preparing the
    ///   stream; the caller may retry.
    /// - [`PlaybackError::TrackNotFound`], [`PlaybackError::ResolveFailed`],
    ///   [`PlaybackError::Network`] or [`PlaybackError::InvalidResponse`]
    ///   for hard failures.
    async fn resolve(&self, track_id: &str) -> Result<StreamDescriptor>;
}

/// [`TrackResolver`] over the platform HTTP client.
pub struct HttpTrackResolver {
    client: Arc<dyn HttpClient>,
    base_url: String,
}

impl HttpTrackResolver {
    /// `base_url` is the API root without a trailing slash. An empty string
    /// targets the site root.
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn stream_url(&self, track_id: &str) -> String {
        format!("{}/stream/{}", self.base_url, track_id)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl TrackResolver for HttpTrackResolver {
    #[instrument(skip(self), fields(status = tracing::field::Empty))]
    async fn resolve(&self, track_id: &str) -> Result<StreamDescriptor> {
        let request =
            HttpRequest::get(self.stream_url(track_id)).header("Accept", "application/json");
        let response = self.client.execute(request).await?;
        tracing::Span::current().record("status", response.status);

        match response.status {
            202 => Err(PlaybackError::NotReady(track_id.to_string())),
            404 => Err(PlaybackError::TrackNotFound(track_id.to_string())),
            status if !response.is_success() => Err(PlaybackError::ResolveFailed {
                track_id: track_id.to_string(),
                status,
            }),
            _ => {
                let descriptor: StreamDescriptor = response
                    .json()
                    .map_err(|e| PlaybackError::InvalidResponse(e.to_string()))?;
                debug!(track_id, cached = descriptor.served_from_cache, "Resolved stream");
                Ok(descriptor)
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use bridge_traits::{
        error::{BridgeError, Result as BridgeResult},
        http::HttpResponse,
    };
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait::async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn resolver_returning(status: u16, body: &'static str) -> HttpTrackResolver {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(move |_| Ok(response(status, body)));
        HttpTrackResolver::new(Arc::new(client), "https://api.example.com/")
    }

    #[tokio::test]
    async fn test_resolves_descriptor() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .withf(|req| req.url == "https://api.example.com/stream/abc")
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"track_id":"abc","title":"Song","artist":"Band","thumbnail":"t",
                        "duration":200,"audio_url":"https://cdn/abc.m4a","cached":false}"#,
                ))
            });
        let resolver = HttpTrackResolver::new(Arc::new(client), "https://api.example.com/");

        let descriptor = resolver.resolve("abc").await.unwrap();
        assert_eq!(descriptor.audio_url, "https://cdn/abc.m4a");
        assert!(!descriptor.served_from_cache);
    }

    #[tokio::test]
    async fn test_accepted_maps_to_not_ready() {
        let err = resolver_returning(202, r#"{"status":"processing"}"#)
            .resolve("abc")
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::NotReady(id) if id == "abc"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let err = resolver_returning(404, "").resolve("abc").await.unwrap_err();
        assert!(matches!(err, PlaybackError::TrackNotFound(_)));

        let err = resolver_returning(500, "").resolve("abc").await.unwrap_err();
        assert!(matches!(err, PlaybackError::ResolveFailed { status: 500, .. }));

        let err = resolver_returning(200, "not json").resolve("abc").await.unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_network() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".into())));
        let resolver = HttpTrackResolver::new(Arc::new(client), "");

        assert_eq!(resolver.stream_url("x"), "/stream/x");
        let err = resolver.resolve("x").await.unwrap_err();
        assert!(matches!(err, PlaybackError::Network(_)));
    }
}
