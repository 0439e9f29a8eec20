//! dApp Instantiation Manifest Pipeline
//!
//! Turns the outcome of one instantiation transaction into a set of
//! ready-to-run transaction manifests, and records the new addresses in the
//! shared `global_config.json` used by the automated jobs.
//!
//! # Key Components
//!
//! - [`EntityExtractor`] - Reads affected global entities for a transaction
//! - [`GatewayClient`] - HTTP implementation of [`AffectedEntitiesSource`]
//! - [`ConfigStore`] / [`ConfigDocument`] - Load and atomically persist the config
//! - [`ConfigMerger`] - Zips extracted values onto `dapp_instant_info`
//! - [`SubstitutionContext`] - Flat `<key>` → value mapping for templates
//! - [`TemplateRenderer`] - Renders `.rtm` templates into a clean directory
//! - [`InstantiationPipeline`] - Runs all of the above in order
//!
//! # Example
//!
//! ```ignore
//! use realm_manifest_instantiation::*;
//!
//! let store = ConfigStore::new(DEFAULT_CONFIG_PATH);
//! let document = store.load()?;
//! let gateway = GatewayClient::new(document.gateway_url(DEFAULT_NETWORK)?)?;
//!
//! let pipeline = InstantiationPipeline::new(
//!     EntityExtractor::new(gateway),
//!     store,
//!     DEFAULT_TEMPLATES_DIR,
//!     DEFAULT_OUTPUT_DIR,
//! );
//! let summary = pipeline.run(document, &TransactionId::new("txid_tdx_2_1...")).await?;
//! ```

mod config;
mod context;
mod error;
mod extractor;
mod gateway;
mod merge;
mod pipeline;
mod render;

pub use config::{ConfigDocument, ConfigStore, DEFAULT_CONFIG_PATH, DEFAULT_NETWORK};
pub use context::{stringify_value, SubstitutionContext, XRD_RESOURCE_ADDRESS_KEY};
pub use error::{InstantiationError, Result};
pub use extractor::{EntityExtractor, EntityLayout, ExtractionResult, TransactionId};
pub use gateway::{
    AffectedEntitiesSource, GatewayClient, COMMITTED_DETAILS_PATH, DEFAULT_TIMEOUT,
    JSON_CONTENT_TYPE,
};
pub use merge::{ConfigMerger, MergePolicy};
pub use pipeline::{InstantiationPipeline, RunSummary};
pub use render::{
    substitute, TemplateRenderer, DEFAULT_OUTPUT_DIR, DEFAULT_TEMPLATES_DIR, MANIFEST_EXTENSION,
};
