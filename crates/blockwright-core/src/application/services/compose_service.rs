//! Compose Service - main application orchestrator.
//!
//! This service turns a request into finished artifacts:
//! 1. Catalog path: resolve, assemble placeholders, guarantee one block
//! 2. Generative path: provider chain, split, write-through
//! 3. Auto: catalog first, generation only when the catalog has no match
//!
//! It implements the driving port (incoming) and uses driven ports (outgoing).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::Assembler,
        services::{catalog_service::CatalogService, generation_service::GenerationService},
    },
    domain::{
        GeneratedArtifact, GenerationRequest, ProviderKind, ResolutionPath, Template,
        ensure_single_block,
    },
    error::{BlockwrightError, BlockwrightResult},
};

/// Where artifacts may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Catalog,
    Generate,
    #[default]
    Auto,
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Catalog => "catalog",
            Self::Generate => "generate",
            Self::Auto => "auto",
        })
    }
}

impl FromStr for SourceMode {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "catalog" => Ok(Self::Catalog),
            "generate" => Ok(Self::Generate),
            "auto" => Ok(Self::Auto),
            other => Err(ApplicationError::ValidationFailed(format!(
                "unknown source mode '{other}' (expected catalog, generate or auto)"
            ))),
        }
    }
}

/// Which path produced the artifacts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Origin {
    Catalog { path: ResolutionPath },
    Generated {
        run_id: Uuid,
        provider: ProviderKind,
        model: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeOutcome {
    pub origin: Origin,
    pub artifacts: Vec<GeneratedArtifact>,
    /// Non-fatal problems (dropped fragments, failed write-through).
    pub warnings: Vec<String>,
}

/// Main compose service.
pub struct ComposeService {
    catalog: CatalogService,
    assembler: Box<dyn Assembler>,
    generation: Option<GenerationService>,
}

impl ComposeService {
    pub fn new(catalog: CatalogService, assembler: Box<dyn Assembler>) -> Self {
        Self {
            catalog,
            assembler,
            generation: None,
        }
    }

    /// Enable the generative path.
    pub fn with_generation(mut self, generation: GenerationService) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    /// Produce artifacts for `request`.
    ///
    /// `overrides` replace placeholder defaults on the catalog path.
    ///
    /// # Errors
    ///
    /// - `NoMatchingTemplate` in catalog mode when nothing matches
    /// - Configuration error when generation is needed but not enabled
    /// - Any generation error in generate mode, or in auto mode after a
    ///   catalog miss
    #[instrument(skip(self, request, overrides), fields(query = %request.free_text))]
    pub async fn compose(
        &self,
        request: &GenerationRequest,
        mode: SourceMode,
        overrides: &BTreeMap<String, String>,
    ) -> BlockwrightResult<ComposeOutcome> {
        match mode {
            SourceMode::Catalog => self.from_catalog(request, overrides),
            SourceMode::Generate => self.from_generation(request).await,
            SourceMode::Auto => match self.from_catalog(request, overrides) {
                Err(e) if e.is_no_match() && self.generation.is_some() => {
                    info!("no catalog match, falling back to generation");
                    self.from_generation(request).await
                }
                other => other,
            },
        }
    }

    fn from_catalog(
        &self,
        request: &GenerationRequest,
        overrides: &BTreeMap<String, String>,
    ) -> BlockwrightResult<ComposeOutcome> {
        let resolution = self.catalog.resolve(request)?;
        let artifacts = resolution
            .templates()
            .map(|t| self.catalog_artifact(t, overrides))
            .collect();

        Ok(ComposeOutcome {
            origin: Origin::Catalog {
                path: resolution.path,
            },
            artifacts,
            warnings: Vec::new(),
        })
    }

    /// Assemble a catalog template and guarantee exactly one block.
    fn catalog_artifact(
        &self,
        template: &Template,
        overrides: &BTreeMap<String, String>,
    ) -> GeneratedArtifact {
        let body = self.assembler.assemble(template, overrides);
        let normalized = ensure_single_block(&body, &template.name);

        GeneratedArtifact {
            body: normalized.body,
            id: template.id.clone(),
            name: template.name.clone(),
            description: template.description.clone(),
            preview_ref: template.preview_ref.clone(),
        }
    }

    async fn from_generation(&self, request: &GenerationRequest) -> BlockwrightResult<ComposeOutcome> {
        let generation = self
            .generation
            .as_ref()
            .ok_or_else(|| BlockwrightError::Configuration {
                message: "generation is not enabled; configure provider credentials".into(),
            })?;

        let report = generation.generate(request).await?;
        let warnings = report
            .discarded
            .iter()
            .map(ToString::to_string)
            .chain(report.warnings.iter().map(ToString::to_string))
            .collect();

        Ok(ComposeOutcome {
            origin: Origin::Generated {
                run_id: report.run_id,
                provider: report.provider,
                model: report.model,
            },
            artifacts: report.artifacts,
            warnings,
        })
    }
}
