//! Catalog adapters.
//!
//! - [`FilesystemCatalog`]: directory of template files, reloaded per call,
//!   with write-through for generated artifacts
//! - [`InMemoryCatalog`]: shared in-process store for tests and embedding
//! - [`fallback`]: the hard-coded catalog served when the directory is unreadable
//!
//! All of them turn raw template source into a [`Template`] through
//! [`template_from_source`], so a file on disk and an in-memory entry with the
//! same text produce the same template.

pub mod fallback;
pub mod filesystem;
pub mod memory;

use tracing::debug;

use blockwright_core::domain::{ConfigBlock, DomainError, Template, TemplateId, config_block};

pub use filesystem::FilesystemCatalog;
pub use memory::InMemoryCatalog;

/// Build a template from its source text.
///
/// A missing or unparseable configuration block does not fail: the entry is
/// produced schema-less with a humanized name.
pub fn template_from_source(
    id: TemplateId,
    source: &str,
    preview_ref: Option<String>,
) -> Result<Template, DomainError> {
    let block = match config_block::extract(source).map(ConfigBlock::parse) {
        Some(Ok(block)) => Some(block),
        Some(Err(e)) => {
            debug!(%id, error = %e, "configuration block unparseable, treating as schema-less");
            None
        }
        None => None,
    };

    let mut builder = Template::builder(id).body(source);
    if let Some(block) = block {
        builder = builder
            .variables(block.variable_definitions())
            .tags(block.tags.clone())
            .description(block.description.clone().unwrap_or_default())
            .preview_ref(preview_ref.or(block.preview.clone()))
            .has_config_block(true);
        if let Some(name) = block.name.filter(|n| !n.trim().is_empty()) {
            builder = builder.name(name);
        }
    } else {
        builder = builder.preview_ref(preview_ref);
    }

    builder.build()
}
