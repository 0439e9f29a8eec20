//! Transaction manifest rendering
//!
//! Templates are plain text files carrying `<key>` placeholders. Rendering is
//! purely textual: manifest syntax is never parsed.

use crate::context::SubstitutionContext;
use crate::error::{InstantiationError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default template directory
pub const DEFAULT_TEMPLATES_DIR: &str = "./templates";

/// Default manifest output directory
pub const DEFAULT_OUTPUT_DIR: &str = "./manifests";

/// Extension of transaction manifest templates
pub const MANIFEST_EXTENSION: &str = ".rtm";

/// Replace every `<key>` in `template` with its context value
///
/// Keys are applied in context order, so a value that itself contains a
/// placeholder for a later key will be substituted again. Placeholders with no
/// context entry are left as they are.
pub fn substitute(template: &str, context: &SubstitutionContext) -> String {
    let mut content = template.to_string();
    for (key, value) in context.iter() {
        let placeholder = format!("<{}>", key);
        if content.contains(&placeholder) {
            content = content.replace(&placeholder, value);
        }
    }
    content
}

/// Renders a template directory into a clean output directory
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    extension: String,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(MANIFEST_EXTENSION)
    }
}

impl TemplateRenderer {
    /// Renderer selecting files whose name ends with `extension`
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Render every matching template from `templates_dir` into `output_dir`
    ///
    /// Anything directly inside `output_dir` is deleted first (files only; a
    /// nested directory is an error). Returns the written manifest paths in
    /// template name order. A failure part-way leaves earlier manifests in
    /// place.
    pub fn render(
        &self,
        templates_dir: &Path,
        output_dir: &Path,
        context: &SubstitutionContext,
    ) -> Result<Vec<PathBuf>> {
        clear_output_dir(output_dir)?;
        fs::create_dir_all(output_dir).map_err(|e| InstantiationError::ManifestWrite {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

        let templates = self.list_templates(templates_dir)?;
        let mut written = Vec::with_capacity(templates.len());

        for template_path in templates {
            let content = fs::read_to_string(&template_path).map_err(|e| {
                InstantiationError::TemplateRead {
                    path: template_path.clone(),
                    source: e,
                }
            })?;

            // list_templates only yields paths with a file name
            let Some(file_name) = template_path.file_name() else {
                continue;
            };
            let output_path = output_dir.join(file_name);

            fs::write(&output_path, substitute(&content, context)).map_err(|e| {
                InstantiationError::ManifestWrite {
                    path: output_path.clone(),
                    source: e,
                }
            })?;

            tracing::debug!(
                template = %template_path.display(),
                manifest = %output_path.display(),
                "Rendered manifest"
            );
            written.push(output_path);
        }

        tracing::info!(
            count = written.len(),
            output = %output_dir.display(),
            "Generated transaction manifests"
        );
        Ok(written)
    }

    /// Matching entries of `templates_dir`, sorted by name
    fn list_templates(&self, templates_dir: &Path) -> Result<Vec<PathBuf>> {
        let read_error = |source: std::io::Error| InstantiationError::TemplateRead {
            path: templates_dir.to_path_buf(),
            source,
        };

        let mut templates = Vec::new();
        for entry in fs::read_dir(templates_dir).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            if entry.file_name().to_string_lossy().ends_with(&self.extension) {
                templates.push(entry.path());
            }
        }
        templates.sort();
        Ok(templates)
    }
}

/// Delete the direct children of `output_dir`, if it exists
fn clear_output_dir(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        return Ok(());
    }

    let cleanup_error = |path: &Path, source: std::io::Error| InstantiationError::OutputCleanup {
        path: path.to_path_buf(),
        source,
    };

    let entries = fs::read_dir(output_dir).map_err(|e| cleanup_error(output_dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| cleanup_error(output_dir, e))?.path();
        fs::remove_file(&path).map_err(|e| cleanup_error(&path, e))?;
    }
    Ok(())
}
