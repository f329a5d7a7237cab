//! `blockwright resolve`: references or prose to catalog templates.

use serde::Serialize;
use tracing::instrument;

use blockwright_core::domain::ResolutionPath;

use crate::{
    cli::ResolveArgs,
    commands::{TemplateSummary, build_request, catalog_service, print_candidates},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(Serialize)]
struct ResolveView<'a> {
    path: ResolutionPath,
    templates: Vec<TemplateSummary<'a>>,
}

#[instrument(skip_all)]
pub fn execute(args: ResolveArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let request = build_request(&args.text, args.limit, &args.exclude.exclude, config)?;
    let resolution = catalog_service(config).resolve(&request)?;

    if output.is_json() {
        return output.json(&ResolveView {
            path: resolution.path,
            templates: resolution
                .candidates
                .iter()
                .map(TemplateSummary::from)
                .collect(),
        });
    }

    let how = match resolution.path {
        ResolutionPath::Explicit => "Resolved by reference:",
        ResolutionPath::Ranked => "Ranked matches:",
    };
    output.header(how)?;
    print_candidates(output, &resolution.candidates)
}
