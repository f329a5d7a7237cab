//! `blockwright search`: rank the catalog against a query.

use tracing::instrument;

use crate::{
    cli::SearchArgs,
    commands::{TemplateSummary, catalog_service, parse_exclusions, print_candidates},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

/// An empty result is reported, not treated as an error.
#[instrument(skip_all)]
pub fn execute(args: SearchArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let query = args.query.join(" ");
    let exclude = parse_exclusions(&args.exclude.exclude)?;
    let limit = args.limit.unwrap_or(config.catalog.max_results);

    let hits = catalog_service(config).search(&query, &exclude, limit)?;

    if output.is_json() {
        let summaries: Vec<TemplateSummary<'_>> = hits.iter().map(TemplateSummary::from).collect();
        return output.json(&summaries);
    }

    if hits.is_empty() {
        output.warning(&format!("No templates match '{query}'"))?;
        return Ok(());
    }

    output.header(&format!("Results for '{query}':"))?;
    print_candidates(output, &hits)
}
