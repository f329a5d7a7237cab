//! Reference resolution: explicit identifier lists versus prose queries.
//!
//! ```text
//! "hero-banner-1, Product Grid"      "I need a hero with a video"
//!            │                                   │
//!     split on , and \n                   one token, > 2 words
//!            │                                   │
//!   every token resolves? ── no ──────────────►  Ranker
//!            │ yes
//!     templates in given order
//! ```
//!
//! Lookup per token: exact id, then exact name, then name containing the
//! token. All comparisons are case-insensitive.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::domain::{
    entities::template::{ScoredCandidate, Template, TemplateId},
    error::DomainError,
    ranking::Ranker,
};

/// Shortest token that may match by name substring.
const MIN_SUBSTRING_TOKEN: usize = 3;

/// Which branch produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPath {
    /// Every reference named a catalog entry; the ranker was not consulted.
    Explicit,
    /// The text was ranked as a query.
    Ranked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub path: ResolutionPath,
    pub candidates: Vec<ScoredCandidate>,
}

impl Resolution {
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.candidates.iter().map(|c| &c.template)
    }
}

/// Dispatches caller text to identifier lookup or the ranker.
pub struct ReferenceResolver {
    ranker: Box<dyn Ranker>,
}

impl ReferenceResolver {
    pub fn new(ranker: Box<dyn Ranker>) -> Self {
        Self { ranker }
    }

    /// Resolve `free_text` against `catalog`.
    ///
    /// # Errors
    ///
    /// `NoMatchingTemplate` when the text is blank or neither branch finds
    /// anything.
    pub fn resolve(
        &self,
        free_text: &str,
        catalog: &[Template],
        exclude: &BTreeSet<TemplateId>,
        max_results: usize,
    ) -> Result<Resolution, DomainError> {
        let tokens = split_references(free_text);
        if tokens.is_empty() {
            return Err(DomainError::NoMatchingTemplate(free_text.to_string()));
        }

        let prose = tokens.len() == 1 && tokens[0].split_whitespace().count() > 2;

        if !prose {
            if let Some(found) = lookup_all(&tokens, catalog) {
                let mut seen = BTreeSet::new();
                let candidates: Vec<ScoredCandidate> = found
                    .into_iter()
                    .filter(|(t, _)| !exclude.contains(&t.id) && seen.insert(t.id.clone()))
                    .take(max_results)
                    .map(|(template, how)| ScoredCandidate {
                        template: template.clone(),
                        score: 0,
                        match_reason: how.to_string(),
                    })
                    .collect();

                debug!(references = tokens.len(), resolved = candidates.len(), "explicit references");
                if candidates.is_empty() {
                    return Err(DomainError::NoMatchingTemplate(free_text.to_string()));
                }
                return Ok(Resolution {
                    path: ResolutionPath::Explicit,
                    candidates,
                });
            }
        }

        let candidates = self.ranker.rank(free_text, catalog, exclude, max_results);
        if candidates.is_empty() {
            return Err(DomainError::NoMatchingTemplate(free_text.to_string()));
        }
        Ok(Resolution {
            path: ResolutionPath::Ranked,
            candidates,
        })
    }
}

/// Split on commas and newlines, trimming and dropping empty pieces.
pub fn split_references(text: &str) -> Vec<&str> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Resolve every token or none.
fn lookup_all<'a>(
    tokens: &[&str],
    catalog: &'a [Template],
) -> Option<Vec<(&'a Template, &'static str)>> {
    tokens.iter().map(|token| lookup(token, catalog)).collect()
}

fn lookup<'a>(token: &str, catalog: &'a [Template]) -> Option<(&'a Template, &'static str)> {
    let needle = token.to_lowercase();

    if let Some(t) = catalog.iter().find(|t| t.id.as_str() == needle) {
        return Some((t, "explicit:id"));
    }
    if let Some(t) = catalog.iter().find(|t| t.name.to_lowercase() == needle) {
        return Some((t, "explicit:name"));
    }
    if needle.chars().count() >= MIN_SUBSTRING_TOKEN {
        if let Some(t) = catalog
            .iter()
            .find(|t| t.name.to_lowercase().contains(&needle))
        {
            return Some((t, "explicit:name-substring"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::{LexicalRanker, MockRanker};

    fn catalog() -> Vec<Template> {
        ["hero-banner-1", "product-grid-1", "testimonials-slider"]
            .iter()
            .map(|id| Template::builder(TemplateId::parse(id).unwrap()).build().unwrap())
            .collect()
    }

    fn never_ranks() -> Box<dyn Ranker> {
        let mut ranker = MockRanker::new();
        ranker.expect_rank().times(0);
        Box::new(ranker)
    }

    fn ids(resolution: &Resolution) -> Vec<&str> {
        resolution.templates().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn explicit_list_resolves_in_order_without_ranker() {
        let resolver = ReferenceResolver::new(never_ranks());
        let out = resolver
            .resolve(
                "testimonials-slider, hero-banner-1,\nproduct-grid-1",
                &catalog(),
                &BTreeSet::new(),
                10,
            )
            .unwrap();
        assert_eq!(out.path, ResolutionPath::Explicit);
        assert_eq!(
            ids(&out),
            vec!["testimonials-slider", "hero-banner-1", "product-grid-1"]
        );
    }

    #[test]
    fn names_and_name_substrings_resolve() {
        let resolver = ReferenceResolver::new(never_ranks());
        let out = resolver
            .resolve("Hero Banner 1, grid", &catalog(), &BTreeSet::new(), 10)
            .unwrap();
        assert_eq!(ids(&out), vec!["hero-banner-1", "product-grid-1"]);
        assert_eq!(out.candidates[0].match_reason, "explicit:name");
        assert_eq!(out.candidates[1].match_reason, "explicit:name-substring");
    }

    #[test]
    fn explicit_path_honours_exclusions_and_limit() {
        let resolver = ReferenceResolver::new(never_ranks());
        let exclude = BTreeSet::from([TemplateId::parse("hero-banner-1").unwrap()]);
        let out = resolver
            .resolve(
                "hero-banner-1, product-grid-1, testimonials-slider",
                &catalog(),
                &exclude,
                1,
            )
            .unwrap();
        assert_eq!(ids(&out), vec!["product-grid-1"]);
    }

    #[test]
    fn prose_always_goes_to_ranker() {
        let mut ranker = MockRanker::new();
        ranker
            .expect_rank()
            .withf(|query, _, _, limit| query.to_string() == "a hero banner please" && *limit == 3)
            .times(1)
            .returning(|_, catalog, _, _| {
                vec![ScoredCandidate {
                    template: catalog[0].clone(),
                    score: 42,
                    match_reason: "mock".into(),
                }]
            });

        let out = ReferenceResolver::new(Box::new(ranker))
            .resolve("a hero banner please", &catalog(), &BTreeSet::new(), 3)
            .unwrap();
        assert_eq!(out.path, ResolutionPath::Ranked);
        assert_eq!(out.candidates[0].score, 42);
    }

    #[test]
    fn partially_unknown_list_falls_back_to_ranking() {
        let resolver = ReferenceResolver::new(Box::new(LexicalRanker::new()));
        let out = resolver
            .resolve("hero-banner-1, pricing-table", &catalog(), &BTreeSet::new(), 5)
            .unwrap();
        assert_eq!(out.path, ResolutionPath::Ranked);
        assert_eq!(ids(&out)[0], "hero-banner-1");
    }

    #[test]
    fn blank_text_is_no_match() {
        let resolver = ReferenceResolver::new(never_ranks());
        assert!(matches!(
            resolver.resolve(" ,\n ", &catalog(), &BTreeSet::new(), 5),
            Err(DomainError::NoMatchingTemplate(_))
        ));
    }

    #[test]
    fn empty_ranking_is_no_match() {
        let mut ranker = MockRanker::new();
        ranker.expect_rank().returning(|_, _, _, _| Vec::new());
        let resolver = ReferenceResolver::new(Box::new(ranker));
        assert!(matches!(
            resolver.resolve("something nobody stocks here", &catalog(), &BTreeSet::new(), 5),
            Err(DomainError::NoMatchingTemplate(_))
        ));
    }

    #[test]
    fn split_references_trims_and_drops_empty() {
        assert_eq!(split_references(" a ,, b\n\nc "), vec!["a", "b", "c"]);
    }
}
