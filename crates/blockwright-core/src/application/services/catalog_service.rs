//! Catalog Service - read-side operations over the template catalog.
//!
//! The catalog is reloaded from its source on every call; nothing is
//! cached between requests.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::{
    application::ports::CatalogSource,
    domain::{
        DomainError, GenerationRequest, LexicalRanker, Ranker, ReferenceResolver, Resolution,
        ScoredCandidate, Template, TemplateId,
    },
    error::BlockwrightResult,
};

/// Service for catalog queries.
pub struct CatalogService {
    source: Box<dyn CatalogSource>,
    ranker: LexicalRanker,
    resolver: ReferenceResolver,
}

impl CatalogService {
    pub fn new(source: Box<dyn CatalogSource>) -> Self {
        Self {
            source,
            ranker: LexicalRanker::new(),
            resolver: ReferenceResolver::new(Box::new(LexicalRanker::new())),
        }
    }

    /// List all templates in catalog order.
    pub fn list(&self) -> BlockwrightResult<Vec<Template>> {
        self.source.load()
    }

    /// Get a template by id.
    pub fn get(&self, id: &TemplateId) -> BlockwrightResult<Template> {
        self.source
            .load()?
            .into_iter()
            .find(|t| &t.id == id)
            .ok_or_else(|| DomainError::NoMatchingTemplate(id.to_string()).into())
    }

    /// Rank the catalog against `query`. An empty result is not an error.
    #[instrument(skip(self, exclude), fields(excluded = exclude.len()))]
    pub fn search(
        &self,
        query: &str,
        exclude: &BTreeSet<TemplateId>,
        limit: usize,
    ) -> BlockwrightResult<Vec<ScoredCandidate>> {
        let catalog = self.source.load()?;
        let hits = self.ranker.rank(query, &catalog, exclude, limit);
        debug!(catalog = catalog.len(), hits = hits.len(), "search finished");
        Ok(hits)
    }

    /// Resolve explicit references or rank prose.
    ///
    /// # Errors
    ///
    /// `NoMatchingTemplate` when nothing resolves and nothing ranks.
    #[instrument(skip_all, fields(query = %request.free_text))]
    pub fn resolve(&self, request: &GenerationRequest) -> BlockwrightResult<Resolution> {
        let catalog = self.source.load()?;
        let resolution = self.resolver.resolve(
            &request.free_text,
            &catalog,
            &request.excluded_ids,
            request.max_results,
        )?;
        debug!(path = ?resolution.path, hits = resolution.candidates.len(), "resolved");
        Ok(resolution)
    }
}
