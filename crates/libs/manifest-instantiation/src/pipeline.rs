//! End-to-end instantiation run
//!
//! ```text
//! extract ──▶ merge (document) ──▶ persist ──▶ flatten ──▶ render
//! ```
//!
//! The document is owned by the run. Nothing is written to disk until the
//! extraction and merge have both succeeded.

use crate::config::{ConfigDocument, ConfigStore};
use crate::context::SubstitutionContext;
use crate::error::Result;
use crate::extractor::{EntityExtractor, TransactionId};
use crate::gateway::AffectedEntitiesSource;
use crate::merge::ConfigMerger;
use crate::render::TemplateRenderer;
use std::path::PathBuf;

/// What a successful run changed
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub transaction_id: TransactionId,
    /// Instant-info keys that received new values, in document order
    pub updated_keys: Vec<String>,
    /// Manifests written to the output directory
    pub manifests: Vec<PathBuf>,
}

/// Wires the extractor, merger, config store and renderer together
pub struct InstantiationPipeline<S> {
    extractor: EntityExtractor<S>,
    merger: ConfigMerger,
    store: ConfigStore,
    renderer: TemplateRenderer,
    templates_dir: PathBuf,
    output_dir: PathBuf,
}

impl<S: AffectedEntitiesSource> InstantiationPipeline<S> {
    pub fn new(
        extractor: EntityExtractor<S>,
        store: ConfigStore,
        templates_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            merger: ConfigMerger::default(),
            store,
            renderer: TemplateRenderer::default(),
            templates_dir: templates_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_merger(mut self, merger: ConfigMerger) -> Self {
        self.merger = merger;
        self
    }

    pub fn with_renderer(mut self, renderer: TemplateRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Run against a document already loaded from the pipeline's store
    pub async fn run(
        &self,
        mut document: ConfigDocument,
        transaction_id: &TransactionId,
    ) -> Result<RunSummary> {
        tracing::info!(%transaction_id, "Starting manifest generation");

        let extraction = self.extractor.extract(transaction_id).await?;
        let updated_keys = self.merger.merge(&mut document, &extraction)?;
        self.store.persist(&document)?;

        let context = SubstitutionContext::flatten(&document);
        let manifests = self
            .renderer
            .render(&self.templates_dir, &self.output_dir, &context)?;

        tracing::info!(
            %transaction_id,
            updated = updated_keys.len(),
            manifests = manifests.len(),
            "Finished manifest generation - updated global config and generated manifests"
        );

        Ok(RunSummary {
            transaction_id: transaction_id.clone(),
            updated_keys,
            manifests,
        })
    }

    /// Load the document from the store, then [`Self::run`]
    pub async fn load_and_run(&self, transaction_id: &TransactionId) -> Result<RunSummary> {
        let document = self.store.load()?;
        self.run(document, transaction_id).await
    }
}
