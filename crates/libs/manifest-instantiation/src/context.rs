//! Flat substitution context for manifest templates

use crate::config::ConfigDocument;
use serde_json::{Map, Value};

/// Key under which the XRD resource address is exposed to templates
pub const XRD_RESOURCE_ADDRESS_KEY: &str = "xrd_resource_address";

/// Ordered key → string mapping used to fill `<key>` placeholders
///
/// Inserting an existing key replaces its value but keeps its position.
/// Every stored value is a `Value::String`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionContext {
    entries: Map<String, Value>,
}

impl SubstitutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the context from a config document
    ///
    /// Sources are applied in order: `dapp_instant_info`, `dapp_accounts`,
    /// then `xrd_resource_address`. Later sources win on key collisions.
    pub fn flatten(document: &ConfigDocument) -> Self {
        let mut context = Self::new();
        context.extend_from_map(document.dapp_instant_info());
        context.extend_from_map(document.dapp_accounts());
        context.insert(
            XRD_RESOURCE_ADDRESS_KEY,
            stringify_value(document.xrd_resource_address()),
        );
        context
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Value::String(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Entries in substitution order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn extend_from_map(&mut self, map: &Map<String, Value>) {
        for (key, value) in map {
            self.insert(key.as_str(), stringify_value(value));
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubstitutionContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

/// Text inserted into a manifest for a config value
///
/// Strings are used verbatim; anything else uses its compact JSON form.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
