//! Positional merge of extracted values into `dapp_instant_info`

use crate::config::ConfigDocument;
use crate::error::{InstantiationError, Result};
use crate::extractor::ExtractionResult;
use serde_json::Value;

/// How to treat a length mismatch between keys and extracted values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Zip semantics: update `min(keys, values)` entries, leave the rest alone
    #[default]
    Lenient,
    /// Refuse to merge unless the counts match exactly
    Strict,
}

/// Zips extracted values onto the instant-info keys of a [`ConfigDocument`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigMerger {
    policy: MergePolicy,
}

impl ConfigMerger {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Merge `extraction` into `document` in place
    ///
    /// The i-th key (in document order) receives the i-th value. Returns the
    /// keys that were updated, in that order.
    pub fn merge(
        &self,
        document: &mut ConfigDocument,
        extraction: &ExtractionResult,
    ) -> Result<Vec<String>> {
        let expected = document.dapp_instant_info().len();
        let actual = extraction.values().len();

        if expected != actual {
            if self.policy == MergePolicy::Strict {
                return Err(InstantiationError::ArityMismatch { expected, actual });
            }
            tracing::warn!(
                keys = expected,
                values = actual,
                "dapp_instant_info key count differs from extracted values; merging the overlap"
            );
        }

        let mut updated = Vec::with_capacity(expected.min(actual));
        for ((key, slot), value) in document
            .dapp_instant_info_mut()
            .iter_mut()
            .zip(extraction.values())
        {
            *slot = Value::String(value.clone());
            updated.push(key.clone());
        }

        tracing::debug!(?updated, "Merged instant info");
        Ok(updated)
    }
}
