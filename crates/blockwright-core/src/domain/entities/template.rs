//! Template domain aggregate and the value objects that travel with it.
//!
//! ## Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Template (Aggregate Root)                                   │
//! │  ├── TemplateId (slug, unique across the catalog)           │
//! │  ├── Category (inferred from the id)                        │
//! │  ├── body (markup + optional {% schema %} block)            │
//! │  └── variables: name -> VariableDefinition                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScoredCandidate   - one ranking hit, lives for one call    │
//! │  GenerationRequest - what the caller asked for              │
//! │  GeneratedArtifact - what the caller gets back              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Templates are rebuilt from storage on every request, so nothing here is
//! shared or mutated after construction.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{
    common::{clean_identifier, humanize},
    config_block,
    entities::category::Category,
    error::DomainError,
};

// ============================================================================
// Template Identity
// ============================================================================

/// Stable slug identifying one catalog entry.
///
/// ## Constraints
///
/// - Non-empty
/// - Only `[a-z0-9-]`, no leading, trailing or doubled hyphen
///
/// Derived from the source file name by [`TemplateId::from_file_stem`], so
/// the same file always produces the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    /// Validate an already-clean identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` when the value is not a canonical slug.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidIdentifier {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(invalid("identifier cannot be empty"));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid("only lowercase letters, digits and '-' are allowed"));
        }
        if value.starts_with('-') || value.ends_with('-') || value.contains("--") {
            return Err(invalid("hyphens must separate non-empty segments"));
        }

        Ok(Self(value.to_string()))
    }

    /// Derive an id from a template file stem (`section-Hero Banner` → `hero-banner`).
    ///
    /// Returns `None` when nothing usable remains after cleaning.
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        let cleaned = clean_identifier(stem);
        (!cleaned.is_empty()).then_some(Self(cleaned))
    }

    /// Wrap output of [`slugify`](crate::domain::common::slugify) that is
    /// known to be non-empty.
    pub(crate) fn from_slug(slug: String) -> Self {
        debug_assert!(Self::parse(&slug).is_ok(), "not a slug: {slug}");
        Self(slug)
    }

    /// Disambiguate a duplicate: `hero` → `hero-2`.
    pub fn with_suffix(&self, n: usize) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hyphen-delimited segments (`hero-banner-1` → `hero`, `banner`, `1`).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('-').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Variables
// ============================================================================

/// One configurable setting declared in a template's configuration block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Setting type as declared (`text`, `color`, `image_picker`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub default: Option<serde_json::Value>,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl VariableDefinition {
    /// Default value rendered as plain text for placeholder substitution.
    pub fn default_text(&self) -> Option<String> {
        match self.default.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

// ============================================================================
// Core Template Aggregate
// ============================================================================

/// A stored page section with placeholders and optional configuration block.
///
/// ## Invariants (enforced by `TemplateBuilder::build`)
///
/// 1. `id` is a canonical slug
/// 2. `name` is non-empty (defaults to the humanized id)
/// 3. `category` is consistent with the id unless explicitly overridden
///
/// A template whose body carries no parseable configuration block is still
/// valid; it is *schema-less* and gets a synthesized block before it is
/// handed to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: Category,
    pub body: String,
    pub variables: BTreeMap<String, VariableDefinition>,
    pub preview_ref: Option<String>,
    /// `false` when the body had no block, or the block failed to parse.
    pub has_config_block: bool,
}

impl Template {
    pub fn builder(id: TemplateId) -> TemplateBuilder {
        TemplateBuilder::new(id)
    }

    /// Schema-less templates need a synthesized block before delivery.
    pub fn is_schema_less(&self) -> bool {
        !self.has_config_block
    }

    /// Body text with every configuration block removed, used for search.
    pub fn markup(&self) -> String {
        config_block::strip_blocks(&self.body)
    }
}

/// Builder for constructing templates.
///
/// Only the id is required. Everything else has a sensible default so the
/// loader can build partial entries from schema-less files.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    id: TemplateId,
    name: Option<String>,
    description: String,
    tags: Vec<String>,
    category: Option<Category>,
    body: String,
    variables: BTreeMap<String, VariableDefinition>,
    preview_ref: Option<String>,
    has_config_block: bool,
}

impl TemplateBuilder {
    pub fn new(id: TemplateId) -> Self {
        Self {
            id,
            name: None,
            description: String::new(),
            tags: Vec::new(),
            category: None,
            body: String::new(),
            variables: BTreeMap::new(),
            preview_ref: None,
            has_config_block: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Override the inferred category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn variable(mut self, name: impl Into<String>, definition: VariableDefinition) -> Self {
        self.variables.insert(name.into(), definition);
        self
    }

    pub fn variables(mut self, variables: BTreeMap<String, VariableDefinition>) -> Self {
        self.variables = variables;
        self
    }

    pub fn preview_ref(mut self, preview_ref: Option<String>) -> Self {
        self.preview_ref = preview_ref;
        self
    }

    pub fn has_config_block(mut self, present: bool) -> Self {
        self.has_config_block = present;
        self
    }

    /// Consume builder and construct `Template`.
    ///
    /// # Errors
    ///
    /// - `InvalidTemplate` if an explicit name is blank
    pub fn build(self) -> Result<Template, DomainError> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(DomainError::InvalidTemplate(format!(
                    "template '{}' has a blank name",
                    self.id
                )));
            }
            Some(name) => name.trim().to_string(),
            None => humanize(self.id.as_str()),
        };

        let category = self
            .category
            .unwrap_or_else(|| Category::infer(self.id.as_str()));

        Ok(Template {
            id: self.id,
            name,
            description: self.description,
            tags: self.tags,
            category,
            body: self.body,
            variables: self.variables,
            preview_ref: self.preview_ref,
            has_config_block: self.has_config_block,
        })
    }
}

// ============================================================================
// Ranking / Generation value objects
// ============================================================================

/// One ranking hit. Exists only for the duration of a ranking call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub template: Template,
    pub score: u32,
    /// Human-readable list of the rules that fired, e.g. `id:hero; category:banner`.
    pub match_reason: String,
}

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub free_text: String,
    pub excluded_ids: BTreeSet<TemplateId>,
    pub max_results: usize,
}

impl GenerationRequest {
    pub fn new(free_text: impl Into<String>, max_results: usize) -> Self {
        Self {
            free_text: free_text.into(),
            excluded_ids: BTreeSet::new(),
            max_results: max_results.max(1),
        }
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = TemplateId>) -> Self {
        self.excluded_ids.extend(ids);
        self
    }
}

/// A ready-to-use section handed back to the caller.
///
/// ## Invariant
///
/// `body` contains exactly one configuration block. Every constructor path
/// goes through [`config_block::ensure_single_block`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub body: String,
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub preview_ref: Option<String>,
}
