//! Gateway access for committed transaction details
//!
//! The pipeline only needs one capability from the ledger: "give me the
//! committed-details body for this transaction". [`AffectedEntitiesSource`]
//! is that seam; [`GatewayClient`] is the HTTP implementation.

use crate::error::{InstantiationError, Result};
use crate::TransactionId;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

/// Path of the committed-details endpoint, relative to the gateway base URL
pub const COMMITTED_DETAILS_PATH: &str = "/transaction/committed-details";

/// Content type sent with every gateway request
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of committed transaction details
///
/// Implementations return the raw JSON body of a successful lookup and fail
/// with [`InstantiationError::TransactionLookup`] otherwise. Interpreting the
/// body is left to [`crate::EntityExtractor`].
#[async_trait]
pub trait AffectedEntitiesSource: Send + Sync {
    /// Fetch committed details, including affected global entities
    async fn committed_details(&self, transaction_id: &TransactionId) -> Result<serde_json::Value>;
}

/// Request body for the committed-details endpoint
#[derive(Debug, Serialize)]
struct CommittedDetailsRequest<'a> {
    intent_hash: &'a str,
    opt_ins: OptIns,
}

#[derive(Debug, Serialize)]
struct OptIns {
    affected_global_entities: bool,
}

/// HTTP client for the ledger gateway
pub struct GatewayClient {
    /// Base URL (e.g., "https://stokenet.radixdlt.com")
    base_url: String,

    /// Reqwest HTTP client
    client: reqwest::Client,
}

impl GatewayClient {
    /// Create a client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(InstantiationError::InvalidGatewayUrl {
                url: base_url,
                message: "must start with http:// or https://".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InstantiationError::InvalidGatewayUrl {
                url: base_url.clone(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn lookup_error(
        transaction_id: &TransactionId,
        status: Option<u16>,
        message: String,
    ) -> InstantiationError {
        InstantiationError::TransactionLookup {
            transaction_id: transaction_id.to_string(),
            status,
            message,
        }
    }
}

#[async_trait]
impl AffectedEntitiesSource for GatewayClient {
    async fn committed_details(&self, transaction_id: &TransactionId) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, COMMITTED_DETAILS_PATH);
        let body = CommittedDetailsRequest {
            intent_hash: transaction_id.as_str(),
            opt_ins: OptIns {
                affected_global_entities: true,
            },
        };

        tracing::debug!(%url, %transaction_id, "Querying committed transaction details");

        // Content type first: `json()` leaves an existing header alone.
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Self::lookup_error(
                    transaction_id,
                    None,
                    format!("request to {} failed: {}", url, e),
                )
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                %url,
                status = status.as_u16(),
                %transaction_id,
                "Gateway lookup failed"
            );
            return Err(Self::lookup_error(
                transaction_id,
                Some(status.as_u16()),
                format!(
                    "HTTP {} {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown"),
                    text
                ),
            ));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| InstantiationError::MalformedResponse {
                transaction_id: transaction_id.to_string(),
                message: format!("response body is not JSON: {}", e),
            })
    }
}
