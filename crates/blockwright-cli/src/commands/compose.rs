//! `blockwright compose`: catalog first, generation as fallback.

use std::collections::BTreeMap;

use tracing::instrument;

use blockwright_core::{application::Origin, domain::ResolutionPath, prelude::SourceMode};

use crate::{
    cli::{ComposeArgs, Source},
    commands::{build_request, compose_service, emit_artifacts},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

impl From<Source> for SourceMode {
    fn from(source: Source) -> Self {
        match source {
            Source::Auto => SourceMode::Auto,
            Source::Catalog => SourceMode::Catalog,
            Source::Generate => SourceMode::Generate,
        }
    }
}

#[instrument(skip_all, fields(source = ?args.source))]
pub async fn execute(
    args: ComposeArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let request = build_request(&args.text, args.count, &args.exclude.exclude, config)?;
    let overrides: BTreeMap<String, String> = args.set.into_iter().collect();
    let service = compose_service(config, args.no_persist)?;

    let spinner = output.spinner("Composing sections");
    let result = service
        .compose(&request, args.source.into(), &overrides)
        .await;
    spinner.finish_and_clear();
    let outcome = result?;

    if output.is_json() {
        return output.json(&outcome);
    }

    for warning in &outcome.warnings {
        output.warning(warning)?;
    }

    let origin = match &outcome.origin {
        Origin::Catalog {
            path: ResolutionPath::Explicit,
        } => "the catalog (by reference)".to_string(),
        Origin::Catalog {
            path: ResolutionPath::Ranked,
        } => "the catalog (ranked)".to_string(),
        Origin::Generated { provider, model, .. } => format!("{provider} ({model})"),
    };
    output.success(&format!(
        "{} section(s) from {origin}",
        outcome.artifacts.len()
    ))?;
    emit_artifacts(output, &outcome.artifacts, args.out_dir.as_deref())
}
