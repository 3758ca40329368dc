//! Transport seam between the connection manager and the services.

use super::sse::SseDecoder;
use crate::config::ServicesConfig;
use crate::health::{parser, HealthSnapshot, ProbeError, ServiceId};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Poll endpoint, relative to a service root
pub const CONNECTED_PATH: &str = "/connected";
/// Event-stream endpoint, relative to a service root
pub const SSE_CONNECTED_PATH: &str = "/sse/connected";

/// Live feed of snapshots from one service.
///
/// Dropping the stream closes the underlying connection.
pub type HealthStream = BoxStream<'static, Result<HealthSnapshot, ProbeError>>;

/// Source of health snapshots for the monitored services.
#[async_trait]
pub trait HealthSource: Send + Sync {
    /// Request one snapshot.
    async fn fetch(&self, service: ServiceId) -> Result<HealthSnapshot, ProbeError>;

    /// Open a persistent feed.
    ///
    /// The connection is established lazily when the stream is first polled.
    /// Transport failures are yielded as `Err` items; a feed that ends yields
    /// [`ProbeError::StreamClosed`] before finishing.
    fn subscribe(&self, service: ServiceId) -> HealthStream;
}

/// HTTP implementation against the reverse-proxied service roots.
pub struct HttpHealthSource {
    /// Shared HTTP client with connection pooling
    client: Client,
    /// Service root URL per service
    roots: BTreeMap<ServiceId, String>,
    /// Timeout applied to poll requests
    timeout_seconds: u64,
}

impl HttpHealthSource {
    /// Create a source with a default client.
    ///
    /// No overall request timeout is set on the client since event streams are
    /// long-lived; poll requests carry their own.
    pub fn new(services: &ServicesConfig, timeout_seconds: u64) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProbeError::ConnectionFailed(e.to_string()))?;

        Ok(Self::with_client(services, timeout_seconds, client))
    }

    /// Create a source with a custom HTTP client (for testing).
    pub fn with_client(services: &ServicesConfig, timeout_seconds: u64, client: Client) -> Self {
        let roots = ServiceId::ALL
            .into_iter()
            .map(|service| {
                let root = services.root(service).trim_end_matches('/').to_string();
                (service, root)
            })
            .collect();

        Self {
            client,
            roots,
            timeout_seconds,
        }
    }

    /// Full URL of `path` on `service`.
    pub fn url(&self, service: ServiceId, path: &str) -> String {
        let root = self.roots.get(&service).map(String::as_str).unwrap_or("");
        format!("{}{}", root, path)
    }
}

#[async_trait]
impl HealthSource for HttpHealthSource {
    async fn fetch(&self, service: ServiceId) -> Result<HealthSnapshot, ProbeError> {
        let url = self.url(service, CONNECTED_PATH);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(e, self.timeout_seconds))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::from_reqwest(e, self.timeout_seconds))?;

        if !status.is_success() {
            return Err(parser::parse_error_body(status.as_u16(), &body));
        }

        parser::parse_poll_body(&body)
    }

    fn subscribe(&self, service: ServiceId) -> HealthStream {
        let client = self.client.clone();
        let url = self.url(service, SSE_CONNECTED_PATH);
        let timeout_seconds = self.timeout_seconds;

        let stream = async_stream::stream! {
            let response = match client
                .get(&url)
                .header(ACCEPT, "text/event-stream")
                .header(CACHE_CONTROL, "no-cache")
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    yield Err(ProbeError::from_reqwest(e, timeout_seconds));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                yield Err(parser::parse_error_body(status.as_u16(), &body));
                return;
            }

            tracing::debug!(service = %service, url = %url, "Event stream opened");

            let mut decoder = SseDecoder::new();
            let mut bytes = response.bytes_stream();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for event in decoder.feed(&chunk) {
                            if event.is_message() {
                                yield parser::parse_stream_event(&event.data);
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(ProbeError::from_reqwest(e, timeout_seconds));
                        return;
                    }
                }
            }

            yield Err(ProbeError::StreamClosed);
        };

        Box::pin(stream)
    }
}
