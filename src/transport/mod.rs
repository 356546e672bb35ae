//! Remote account operations.
//!
//! [`AccountTransport`] is the seam between the store and the network: one
//! method per backend call, no retries, failures surfaced immediately.
//! [`HttpTransport`] is the production implementation.

mod http;

pub use http::{HttpTransport, DEFAULT_MAX_RESPONSE_BYTES};

use crate::account::{Integration, IntegrationService};
use crate::mapper::{map_account, AccountPayload, Mapped, MappingIssue, RefreshAck};
use crate::util::UrlValidationError;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Operations
// ============================================================================

/// Backend operation, used to label requests in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadAccount,
    Connect(IntegrationService),
    Disconnect(IntegrationService),
    RefreshRecommendations,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::LoadAccount => f.write_str("load account"),
            Operation::Connect(service) => write!(f, "connect {service}"),
            Operation::Disconnect(service) => write!(f, "disconnect {service}"),
            Operation::RefreshRecommendations => f.write_str("refresh recommendations"),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while talking to the account backend.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-2xx response.
    #[error("Failed to {operation} ({status})")]
    HttpStatus { operation: Operation, status: u16 },

    /// Connection, DNS, or TLS failure.
    #[error("Failed to {operation}: {source}")]
    Network {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to {operation}: request timed out after {secs}s")]
    Timeout { operation: Operation, secs: u64 },

    #[error("Failed to {operation}: response exceeds {limit} bytes")]
    ResponseTooLarge { operation: Operation, limit: usize },

    /// Body was not the JSON shape expected for the operation.
    #[error("Failed to {operation}: invalid response body: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    /// Integration response named a service this client does not know.
    #[error("Failed to {operation}: {source}")]
    Mapping {
        operation: Operation,
        #[source]
        source: MappingIssue,
    },

    #[error("Invalid backend base URL: {0}")]
    InvalidBaseUrl(#[from] UrlValidationError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    /// HTTP status for status-code failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The operation that failed, when the error came from a request.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            TransportError::HttpStatus { operation, .. }
            | TransportError::Network { operation, .. }
            | TransportError::Timeout { operation, .. }
            | TransportError::ResponseTooLarge { operation, .. }
            | TransportError::Decode { operation, .. }
            | TransportError::Mapping { operation, .. } => Some(*operation),
            TransportError::InvalidBaseUrl(_) | TransportError::Client(_) => None,
        }
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Remote operations the account store depends on.
///
/// Implementations must not retry; the store decides what a failure means.
#[async_trait]
pub trait AccountTransport: Send + Sync {
    /// `GET /api/accounts/{accountId}`
    async fn fetch_account(&self, account_id: &str) -> Result<AccountPayload, TransportError>;

    /// `POST /api/accounts/{accountId}/integrations/{service}/connect`
    async fn connect_integration(
        &self,
        account_id: &str,
        service: IntegrationService,
    ) -> Result<Integration, TransportError>;

    /// `POST /api/accounts/{accountId}/integrations/{service}/disconnect`
    async fn disconnect_integration(
        &self,
        account_id: &str,
        service: IntegrationService,
    ) -> Result<Integration, TransportError>;

    /// `POST /api/accounts/{accountId}/recommendations/refresh`
    async fn queue_recommendation_refresh(
        &self,
        account_id: &str,
    ) -> Result<RefreshAck, TransportError>;
}

/// Reads the account and maps it into a complete state.
pub async fn fetch_account_state(
    transport: &dyn AccountTransport,
    account_id: &str,
) -> Result<Mapped, TransportError> {
    let payload = transport.fetch_account(account_id).await?;
    Ok(map_account(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_labels() {
        assert_eq!(Operation::LoadAccount.to_string(), "load account");
        assert_eq!(
            Operation::Connect(IntegrationService::Youtube).to_string(),
            "connect youtube"
        );
        assert_eq!(
            Operation::Disconnect(IntegrationService::Spotify).to_string(),
            "disconnect spotify"
        );
        assert_eq!(
            Operation::RefreshRecommendations.to_string(),
            "refresh recommendations"
        );
    }

    #[test]
    fn test_status_error_message() {
        let err = TransportError::HttpStatus {
            operation: Operation::LoadAccount,
            status: 503,
        };
        assert_eq!(err.to_string(), "Failed to load account (503)");
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.operation(), Some(Operation::LoadAccount));
    }
}
