//! Command handlers, one module per subcommand.
//!
//! The helpers here wire adapters into core services from [`AppConfig`], so
//! every command builds its services the same way.

use std::{
    collections::BTreeSet,
    fs,
    path::Path,
    sync::Arc,
};

use serde::Serialize;
use tracing::{debug, info};

use blockwright_adapters::{FilesystemCatalog, PlaceholderAssembler, ReqwestTransport};
use blockwright_core::{
    domain::Category,
    error::BlockwrightError,
    prelude::{
        CatalogService, ComposeService, GeneratedArtifact, GenerationRequest, GenerationService,
        ResilientClient, ScoredCandidate, Template, TemplateId,
    },
};

use crate::{
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

pub mod completions;
pub mod compose;
pub mod config;
pub mod generate;
pub mod init;
pub mod list;
pub mod providers;
pub mod resolve;
pub mod search;

// ── service wiring ────────────────────────────────────────────────────────────

pub fn catalog_service(config: &AppConfig) -> CatalogService {
    debug!(dir = %config.catalog.templates_dir.display(), "using catalog");
    CatalogService::new(Box::new(FilesystemCatalog::new(
        config.catalog.templates_dir.clone(),
    )))
}

/// Provider chain from config.  Write-through goes to the catalog directory
/// unless disabled in config or by `--no-persist`.
pub fn generation_service(config: &AppConfig, no_persist: bool) -> CliResult<GenerationService> {
    let transport = ReqwestTransport::new().map_err(|e| BlockwrightError::Internal {
        message: format!("HTTP client could not be created: {e}"),
    })?;

    let client = ResilientClient::new(Arc::new(transport), config.registry(), config.credentials())
        .with_models(config.models())
        .with_params(config.generation_params())
        .with_policy(config.retry_policy());

    let service = GenerationService::new(client);
    if config.catalog.write_through && !no_persist {
        Ok(service.with_sink(Box::new(FilesystemCatalog::new(
            config.catalog.templates_dir.clone(),
        ))))
    } else {
        info!("write-through disabled");
        Ok(service)
    }
}

pub fn compose_service(config: &AppConfig, no_persist: bool) -> CliResult<ComposeService> {
    Ok(
        ComposeService::new(catalog_service(config), Box::new(PlaceholderAssembler::new()))
            .with_generation(generation_service(config, no_persist)?),
    )
}

// ── request helpers ───────────────────────────────────────────────────────────

/// Validate `--exclude` values as template ids.
pub fn parse_exclusions(raw: &[String]) -> CliResult<BTreeSet<TemplateId>> {
    raw.iter()
        .map(|id| {
            TemplateId::parse(id.trim()).map_err(|e| CliError::InvalidInput {
                message: format!("--exclude '{id}' is not a template id"),
                source: Some(Box::new(e)),
            })
        })
        .collect()
}

pub fn build_request(
    text: &str,
    max_results: Option<usize>,
    exclude: &[String],
    config: &AppConfig,
) -> CliResult<GenerationRequest> {
    if text.trim().is_empty() {
        return Err(CliError::InvalidInput {
            message: "request text is empty".into(),
            source: None,
        });
    }
    Ok(
        GenerationRequest::new(text, max_results.unwrap_or(config.catalog.max_results))
            .excluding(parse_exclusions(exclude)?),
    )
}

// ── shared rendering ──────────────────────────────────────────────────────────

/// Catalog entry without its body, for listings and JSON.
#[derive(Debug, Serialize)]
pub struct TemplateSummary<'a> {
    pub id: &'a TemplateId,
    pub name: &'a str,
    pub category: Category,
    pub description: &'a str,
    pub schema_less: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

impl<'a> From<&'a Template> for TemplateSummary<'a> {
    fn from(t: &'a Template) -> Self {
        Self {
            id: &t.id,
            name: &t.name,
            category: t.category,
            description: &t.description,
            schema_less: t.is_schema_less(),
            preview: t.preview_ref.as_deref(),
            score: None,
            reason: None,
        }
    }
}

impl<'a> From<&'a ScoredCandidate> for TemplateSummary<'a> {
    fn from(c: &'a ScoredCandidate) -> Self {
        Self {
            score: Some(c.score),
            reason: Some(&c.match_reason),
            ..Self::from(&c.template)
        }
    }
}

/// One line per candidate: `id  score  name  (reason)`.
pub fn print_candidates(output: &OutputManager, candidates: &[ScoredCandidate]) -> CliResult<()> {
    let width = candidates
        .iter()
        .map(|c| c.template.id.as_str().len())
        .max()
        .unwrap_or(0);
    for c in candidates {
        output.data(&format!(
            "{:<width$}  {:>4}  {}  {}",
            c.template.id.as_str(),
            c.score,
            c.template.name,
            output.dim(&format!("({})", c.match_reason)),
        ))?;
    }
    Ok(())
}

/// Print artifact bodies, or write them to `<out_dir>/<id>.liquid`.
pub fn emit_artifacts(
    output: &OutputManager,
    artifacts: &[GeneratedArtifact],
    out_dir: Option<&Path>,
) -> CliResult<()> {
    match out_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_cli_context(|| format!("Failed to create '{}'", dir.display()))?;
            for artifact in artifacts {
                let path = dir.join(format!("{}.liquid", artifact.id));
                fs::write(&path, &artifact.body)
                    .with_cli_context(|| format!("Failed to write '{}'", path.display()))?;
                output.success(&format!("{} → {}", artifact.name, path.display()))?;
            }
        }
        None => {
            for (i, artifact) in artifacts.iter().enumerate() {
                if i > 0 {
                    output.data("")?;
                }
                output.header(&format!("── {} ({}) ──", artifact.name, artifact.id))?;
                output.data(artifact.body.trim_end())?;
            }
        }
    }
    Ok(())
}
