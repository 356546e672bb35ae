use super::{AccountTransport, Operation, TransportError};
use crate::account::{Integration, IntegrationService};
use crate::config::Config;
use crate::mapper::{
    map_integration, AccountPayload, IntegrationPayload, MappingIssue, RefreshAck,
};
use crate::util::validate_base_url;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Upper bound on a response body. Account payloads are a few KiB.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// reqwest-backed [`AccountTransport`].
///
/// No authentication headers are added; the session is expected to be carried
/// by whatever sits in front of the backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    max_response_bytes: usize,
}

impl HttpTransport {
    /// Builds a transport with a dedicated client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend root, e.g. `http://localhost:4000`; any path is kept
    ///   as a prefix in front of `/api/accounts/...`
    /// * `timeout` - Upper bound for each request, including the body read
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidBaseUrl`] - Not an http(s) URL with a host, or
    ///   carries a query or fragment
    /// - [`TransportError::Client`] - The TLS backend failed to initialize
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;
        Self::with_client(client, base_url, timeout)
    }

    /// Builds a transport that shares an existing client.
    ///
    /// `timeout` is still enforced per request even if `client` has none.
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let normalized = validate_base_url(base_url)?;
        let base_url = Url::parse(&normalized).map_err(crate::util::UrlValidationError::from)?;
        Ok(Self {
            client,
            base_url,
            timeout,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Overrides the response size cap.
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/api/accounts/{accountId}/{tail..}` with each segment percent-encoded.
    fn endpoint(&self, account_id: &str, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // http(s) URLs always have a path, so this only fails for
        // cannot-be-a-base URLs, which validation already rejects.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "accounts", account_id])
                .extend(tail);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = tokio::time::timeout(
            self.timeout,
            request.header(ACCEPT, "application/json").send(),
        )
        .await
        .map_err(|_| TransportError::Timeout {
            operation,
            secs: self.timeout.as_secs(),
        })?
        .map_err(|source| request_error(operation, self.timeout, source))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%operation, status = status.as_u16(), "Account backend returned error status");
            return Err(TransportError::HttpStatus {
                operation,
                status: status.as_u16(),
            });
        }

        let body =
            read_limited_body(response, self.max_response_bytes, operation, self.timeout).await?;
        serde_json::from_slice(&body).map_err(|source| TransportError::Decode { operation, source })
    }

    async fn mutate_integration(
        &self,
        account_id: &str,
        service: IntegrationService,
        operation: Operation,
        action: &str,
    ) -> Result<Integration, TransportError> {
        let url = self.endpoint(account_id, &["integrations", service.as_str(), action]);
        tracing::debug!(%url, %operation, "Mutating integration");
        let payload: IntegrationPayload = self.send(operation, self.client.post(url)).await?;
        let integration = map_integration(payload)
            .map_err(|source| TransportError::Mapping { operation, source })?;
        if integration.id != service {
            return Err(TransportError::Mapping {
                operation,
                source: MappingIssue::ServiceMismatch {
                    requested: service,
                    received: integration.id,
                },
            });
        }
        Ok(integration)
    }
}

#[async_trait]
impl AccountTransport for HttpTransport {
    async fn fetch_account(&self, account_id: &str) -> Result<AccountPayload, TransportError> {
        let url = self.endpoint(account_id, &[]);
        tracing::debug!(%url, "Fetching account");
        self.send(Operation::LoadAccount, self.client.get(url)).await
    }

    async fn connect_integration(
        &self,
        account_id: &str,
        service: IntegrationService,
    ) -> Result<Integration, TransportError> {
        self.mutate_integration(account_id, service, Operation::Connect(service), "connect")
            .await
    }

    async fn disconnect_integration(
        &self,
        account_id: &str,
        service: IntegrationService,
    ) -> Result<Integration, TransportError> {
        self.mutate_integration(
            account_id,
            service,
            Operation::Disconnect(service),
            "disconnect",
        )
        .await
    }

    async fn queue_recommendation_refresh(
        &self,
        account_id: &str,
    ) -> Result<RefreshAck, TransportError> {
        let url = self.endpoint(account_id, &["recommendations", "refresh"]);
        tracing::debug!(%url, "Queueing recommendation refresh");
        self.send(Operation::RefreshRecommendations, self.client.post(url))
            .await
    }
}

/// Classifies a reqwest failure; client-level timeouts surface here rather
/// than through `tokio::time::timeout`.
fn request_error(
    operation: Operation,
    timeout: Duration,
    source: reqwest::Error,
) -> TransportError {
    if source.is_timeout() {
        TransportError::Timeout {
            operation,
            secs: timeout.as_secs(),
        }
    } else {
        TransportError::Network { operation, source }
    }
}

/// Reads a response body, refusing anything larger than `limit` bytes.
async fn read_limited_body(
    response: reqwest::Response,
    limit: usize,
    operation: Operation,
    timeout: Duration,
) -> Result<Vec<u8>, TransportError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(TransportError::ResponseTooLarge { operation, limit });
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| request_error(operation, timeout, source))?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(TransportError::ResponseTooLarge { operation, limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
