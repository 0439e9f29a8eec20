//! Error types for the instantiation pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for instantiation pipeline operations
pub type Result<T> = std::result::Result<T, InstantiationError>;

/// Error types for the instantiation pipeline
///
/// Every variant is fatal to a run. Nothing is retried.
#[derive(Debug, Error)]
pub enum InstantiationError {
    /// The global config file does not exist
    #[error("Config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// The global config file exists but could not be read or decoded
    #[error("Failed to parse config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// Writing the updated config back to disk failed
    #[error("Failed to write config {}: {source}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No gateway URL is configured for the requested network
    #[error("No gateway_url_base entry for network '{network}'")]
    MissingGatewayUrl { network: String },

    /// The gateway client could not be built for this base URL
    #[error("Invalid gateway URL '{url}': {message}")]
    InvalidGatewayUrl { url: String, message: String },

    /// The gateway did not report the transaction as found
    #[error("Error obtaining affected_global_entities for transaction id {transaction_id}: {message}")]
    TransactionLookup {
        transaction_id: String,
        status: Option<u16>,
        message: String,
    },

    /// The gateway answered, but not with the expected shape
    #[error("Malformed committed-details response for transaction id {transaction_id}: {message}")]
    MalformedResponse {
        transaction_id: String,
        message: String,
    },

    /// Strict merge found a different number of values than instant-info keys
    #[error("dapp_instant_info has {expected} keys but the transaction yielded {actual} values")]
    ArityMismatch { expected: usize, actual: usize },

    /// Clearing the previous manifests failed
    #[error("Failed to clear output entry {}: {source}", path.display())]
    OutputCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template could not be listed or read
    #[error("Failed to read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rendered manifest could not be written
    #[error("Failed to write manifest {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstantiationError {
    /// HTTP status reported by the gateway, if the failure came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TransactionLookup { status, .. } => *status,
            _ => None,
        }
    }
}
