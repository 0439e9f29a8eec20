//! Global config document shared with the automated jobs
//!
//! The whole document is kept as one ordered JSON object so a rewrite leaves
//! every top-level key where it was, including the ones other jobs own. The
//! fields the pipeline needs are checked on load and reached through
//! accessors.

use crate::error::{InstantiationError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default location of the global config, relative to the manifest directory
pub const DEFAULT_CONFIG_PATH: &str = "../config/global_config.json";

/// Network used when none is requested
pub const DEFAULT_NETWORK: &str = "stokenet";

const GATEWAY_URL_BASE: &str = "gateway_url_base";
const DAPP_INSTANT_INFO: &str = "dapp_instant_info";
const DAPP_ACCOUNTS: &str = "dapp_accounts";
const XRD_RESOURCE_ADDRESS: &str = "xrd_resource_address";

/// Root of `global_config.json`
///
/// Guaranteed to hold `gateway_url_base`, `dapp_instant_info` and
/// `dapp_accounts` as objects plus an `xrd_resource_address` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Map<String, Value>,
}

impl ConfigDocument {
    fn from_map(root: Map<String, Value>) -> std::result::Result<Self, String> {
        for key in [GATEWAY_URL_BASE, DAPP_INSTANT_INFO, DAPP_ACCOUNTS] {
            match root.get(key) {
                Some(Value::Object(_)) => {}
                Some(other) => {
                    return Err(format!("`{}` must be an object, found {}", key, type_name(other)))
                }
                None => return Err(format!("missing field `{}`", key)),
            }
        }
        if !root.contains_key(XRD_RESOURCE_ADDRESS) {
            return Err(format!("missing field `{}`", XRD_RESOURCE_ADDRESS));
        }
        Ok(Self { root })
    }

    /// Gateway base URL per network name
    pub fn gateway_url_base(&self) -> &Map<String, Value> {
        self.object(GATEWAY_URL_BASE)
    }

    /// Values produced by the latest dApp instantiation, in merge order
    pub fn dapp_instant_info(&self) -> &Map<String, Value> {
        self.object(DAPP_INSTANT_INFO)
    }

    pub fn dapp_instant_info_mut(&mut self) -> &mut Map<String, Value> {
        self.object_mut(DAPP_INSTANT_INFO)
    }

    /// Static account addresses used by the manifests
    pub fn dapp_accounts(&self) -> &Map<String, Value> {
        self.object(DAPP_ACCOUNTS)
    }

    pub fn dapp_accounts_mut(&mut self) -> &mut Map<String, Value> {
        self.object_mut(DAPP_ACCOUNTS)
    }

    /// Address of the XRD resource on the configured network
    pub fn xrd_resource_address(&self) -> &Value {
        self.root.get(XRD_RESOURCE_ADDRESS).unwrap_or(&Value::Null)
    }

    /// Gateway base URL for `network`
    pub fn gateway_url(&self, network: &str) -> Result<&str> {
        self.gateway_url_base()
            .get(network)
            .and_then(Value::as_str)
            .ok_or_else(|| InstantiationError::MissingGatewayUrl {
                network: network.to_string(),
            })
    }

    /// Instant-info keys in their declared order
    pub fn instant_info_keys(&self) -> impl Iterator<Item = &str> {
        self.dapp_instant_info().keys().map(String::as_str)
    }

    fn object(&self, key: &str) -> &Map<String, Value> {
        match self.root.get(key) {
            Some(Value::Object(map)) => map,
            _ => unreachable!("`{}` is checked to be an object on construction", key),
        }
    }

    fn object_mut(&mut self, key: &str) -> &mut Map<String, Value> {
        match self.root.get_mut(key) {
            Some(Value::Object(map)) => map,
            _ => unreachable!("`{}` is checked to be an object on construction", key),
        }
    }
}

impl Serialize for ConfigDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConfigDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let root = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(root).map_err(serde::de::Error::custom)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loads and persists a [`ConfigDocument`] at a fixed path
///
/// There is no locking: two runs against the same file race, last writer wins.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the document
    pub fn load(&self) -> Result<ConfigDocument> {
        if !self.path.exists() {
            return Err(InstantiationError::ConfigNotFound {
                path: self.path.clone(),
            });
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| InstantiationError::ConfigParse {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        let document: ConfigDocument =
            serde_json::from_str(&content).map_err(|e| InstantiationError::ConfigParse {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            path = %self.path.display(),
            instant_info_keys = document.dapp_instant_info().len(),
            "Loaded global config"
        );
        Ok(document)
    }

    /// Overwrite the backing file with `document`
    ///
    /// The new content goes to a temp file in the same directory which is
    /// synced and renamed over the target, so a crash never leaves a torn file.
    /// An existing file keeps its permissions.
    pub fn persist(&self, document: &ConfigDocument) -> Result<()> {
        let bytes = to_pretty_json(document).map_err(|e| self.write_error(e.into()))?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| self.write_error(e))?;
        temp_file
            .write_all(&bytes)
            .map_err(|e| self.write_error(e))?;

        // NamedTempFile is created owner-only
        if let Ok(metadata) = std::fs::metadata(&self.path) {
            temp_file
                .as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| self.write_error(e))?;
        }

        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| self.write_error(e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        tracing::info!(path = %self.path.display(), "Updated global config");
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> InstantiationError {
        InstantiationError::ConfigWrite {
            path: self.path.clone(),
            source,
        }
    }
}

/// Serialize with four-space indentation, matching the hand-edited file
fn to_pretty_json(document: &ConfigDocument) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    document.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "gateway_url_base": {
                "stokenet": "https://stokenet.radixdlt.com",
                "mainnet": "https://mainnet.radixdlt.com"
            },
            "validators": ["validator_a", "validator_b"],
            "dapp_instant_info": {
                "instantiate_tx_id": "<placeholder>",
                "component_address": "<placeholder>",
                "badge_resource_address": "<placeholder>"
            },
            "dapp_accounts": {"owner_account": "account_tdx_owner"},
            "xrd_resource_address": "resource_tdx_xrd",
            "job_interval_secs": 60
        })
    }

    fn write_sample(dir: &Path) -> PathBuf {
        let path = dir.join("global_config.json");
        std::fs::write(&path, serde_json::to_string_pretty(&sample()).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("absent.json"));
        assert!(matches!(
            store.load(),
            Err(InstantiationError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ConfigStore::new(&path).load(),
            Err(InstantiationError::ConfigParse { .. })
        ));

        std::fs::write(&path, r#"{"dapp_accounts": {}}"#).unwrap();
        assert!(matches!(
            ConfigStore::new(&path).load(),
            Err(InstantiationError::ConfigParse { .. })
        ));

        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            ConfigStore::new(&path).load(),
            Err(InstantiationError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_required_fields_must_have_the_right_shape() {
        let mut value = sample();
        value["dapp_instant_info"] = json!(["not", "an", "object"]);
        let err = serde_json::from_value::<ConfigDocument>(value).unwrap_err();
        assert!(err.to_string().contains("dapp_instant_info"));

        let mut value = sample();
        value.as_object_mut().unwrap().remove("xrd_resource_address");
        let err = serde_json::from_value::<ConfigDocument>(value).unwrap_err();
        assert!(err.to_string().contains("xrd_resource_address"));

        assert!(serde_json::from_value::<ConfigDocument>(json!("config")).is_err());
    }

    #[test]
    fn test_load_preserves_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(write_sample(dir.path()));
        let doc = store.load().unwrap();

        let keys: Vec<&str> = doc.instant_info_keys().collect();
        assert_eq!(
            keys,
            vec!["instantiate_tx_id", "component_address", "badge_resource_address"]
        );
        assert_eq!(doc.gateway_url_base().len(), 2);
        assert_eq!(doc.xrd_resource_address(), &json!("resource_tdx_xrd"));
    }

    #[test]
    fn test_persist_round_trips_unrelated_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(write_sample(dir.path()));
        let mut doc = store.load().unwrap();
        doc.dapp_instant_info_mut()
            .insert("component_address".into(), json!("component_new"));

        store.persist(&doc).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["validators"], json!(["validator_a", "validator_b"]));
        assert_eq!(raw["dapp_instant_info"]["component_address"], "component_new");
        assert_eq!(store.load().unwrap(), doc);

        // Only the config itself is left behind, no temp files.
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_persist_keeps_top_level_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(write_sample(dir.path()));
        let mut doc = store.load().unwrap();
        doc.dapp_instant_info_mut()
            .insert("instantiate_tx_id".into(), json!("txABC"));

        store.persist(&doc).unwrap();

        let raw: Map<String, Value> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        let keys: Vec<&str> = raw.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "gateway_url_base",
                "validators",
                "dapp_instant_info",
                "dapp_accounts",
                "xrd_resource_address",
                "job_interval_secs"
            ]
        );
        assert_eq!(raw["job_interval_secs"], json!(60));
    }

    #[cfg(unix)]
    #[test]
    fn test_persist_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(write_sample(dir.path()));
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        let doc = store.load().unwrap();
        store.persist(&doc).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_persist_uses_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(write_sample(dir.path()));
        let doc = store.load().unwrap();
        store.persist(&doc).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("{\n    \"gateway_url_base\": {\n        \"stokenet\""));
    }

    #[test]
    fn test_gateway_url_lookup() {
        let doc: ConfigDocument = serde_json::from_value(sample()).unwrap();
        assert_eq!(
            doc.gateway_url(DEFAULT_NETWORK).unwrap(),
            "https://stokenet.radixdlt.com"
        );
        assert!(matches!(
            doc.gateway_url("localnet"),
            Err(InstantiationError::MissingGatewayUrl { .. })
        ));
    }
}
