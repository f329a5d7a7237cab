//! In-memory catalog implementing both catalog ports.

use std::sync::{Arc, RwLock};

use blockwright_core::{
    application::{
        ApplicationError,
        ports::{CatalogSink, CatalogSource},
    },
    domain::{GeneratedArtifact, Template},
    error::BlockwrightResult,
};

use super::{fallback::fallback_catalog, template_from_source};

/// Thread-safe in-memory catalog.
///
/// Clones share storage, so a clone handed to a generation service as its
/// sink makes persisted artifacts visible to the original.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<RwLock<Vec<Template>>>,
}

impl InMemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: Vec<Template>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(templates)),
        }
    }

    /// Create a catalog seeded with the built-in entries.
    pub fn with_builtin() -> Self {
        Self::with_templates(fallback_catalog())
    }

    /// Append a template, replacing any entry with the same id in place.
    pub fn insert(&self, template: Template) -> BlockwrightResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        match inner.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => inner.push(template),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogSource for InMemoryCatalog {
    fn load(&self) -> BlockwrightResult<Vec<Template>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(inner.clone())
    }
}

impl CatalogSink for InMemoryCatalog {
    fn persist(&self, artifact: &GeneratedArtifact, _query: &str) -> BlockwrightResult<()> {
        let template = template_from_source(
            artifact.id.clone(),
            &artifact.body,
            artifact.preview_ref.clone(),
        )?;
        self.insert(template)
    }
}
