//! Instant-info extraction from an instantiation transaction
//!
//! The gateway reports affected global entities in a stable order: the
//! fee-paying account first, the system-level entity last, and the entities
//! created by the instantiation in between. [`EntityLayout`] names that shape
//! so a change to it fails loudly instead of shifting every value by one.

use crate::error::{InstantiationError, Result};
use crate::gateway::AffectedEntitiesSource;
use std::fmt;

/// Identifier of a committed transaction (the intent hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a caller-supplied transaction id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Expected layout of the affected-global-entities list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLayout {
    /// Fee payer first, one system entity last, created entities in between
    V1,
}

impl EntityLayout {
    /// Number of entities reported before the created ones
    pub fn leading(&self) -> usize {
        match self {
            Self::V1 => 1,
        }
    }

    /// Number of entities reported after the created ones
    pub fn trailing(&self) -> usize {
        match self {
            Self::V1 => 1,
        }
    }

    /// Slice out the created entities, or `None` if the list is too short
    pub fn created<'a>(&self, entities: &'a [String]) -> Option<&'a [String]> {
        let minimum = self.leading() + self.trailing();
        if entities.len() < minimum {
            return None;
        }
        Some(&entities[self.leading()..entities.len() - self.trailing()])
    }
}

impl Default for EntityLayout {
    fn default() -> Self {
        Self::V1
    }
}

/// Ordered instant-info values: the transaction id followed by created entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    values: Vec<String>,
}

impl ExtractionResult {
    /// Build a result from a transaction id and the created entities
    pub fn new(transaction_id: &TransactionId, created: &[String]) -> Self {
        let mut values = Vec::with_capacity(created.len() + 1);
        values.push(transaction_id.to_string());
        values.extend(created.iter().cloned());
        Self { values }
    }

    /// The transaction id (always the first value)
    pub fn transaction_id(&self) -> &str {
        &self.values[0]
    }

    /// All values in merge order
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Turns a transaction id into an [`ExtractionResult`]
pub struct EntityExtractor<S> {
    source: S,
    layout: EntityLayout,
}

impl<S: AffectedEntitiesSource> EntityExtractor<S> {
    /// Create an extractor using the current gateway layout
    pub fn new(source: S) -> Self {
        Self {
            source,
            layout: EntityLayout::default(),
        }
    }

    /// Query the gateway and extract the instant-info values
    pub async fn extract(&self, transaction_id: &TransactionId) -> Result<ExtractionResult> {
        let details = self.source.committed_details(transaction_id).await?;
        let entities = affected_global_entities(transaction_id, &details)?;

        let created = self.layout.created(&entities).ok_or_else(|| {
            InstantiationError::MalformedResponse {
                transaction_id: transaction_id.to_string(),
                message: format!(
                    "expected at least {} affected global entities for layout {:?}, got {}",
                    self.layout.leading() + self.layout.trailing(),
                    self.layout,
                    entities.len()
                ),
            }
        })?;

        let result = ExtractionResult::new(transaction_id, created);
        tracing::info!(
            %transaction_id,
            affected = entities.len(),
            extracted = result.values().len(),
            "Extracted dApp instant info"
        );
        Ok(result)
    }
}

/// Read `transaction.affected_global_entities` out of a committed-details body
fn affected_global_entities(
    transaction_id: &TransactionId,
    details: &serde_json::Value,
) -> Result<Vec<String>> {
    let malformed = |message: String| InstantiationError::MalformedResponse {
        transaction_id: transaction_id.to_string(),
        message,
    };

    let entities = details
        .get("transaction")
        .ok_or_else(|| malformed("missing 'transaction' object".to_string()))?
        .get("affected_global_entities")
        .ok_or_else(|| malformed("missing 'transaction.affected_global_entities'".to_string()))?
        .as_array()
        .ok_or_else(|| malformed("'transaction.affected_global_entities' is not an array".to_string()))?;

    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| {
            entity
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("affected global entity {} is not a string", index)))
        })
        .collect()
}
