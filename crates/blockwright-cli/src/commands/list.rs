//! Implementation of the `blockwright list` command.

use blockwright_core::domain::Category;

use crate::{
    cli::ListArgs,
    commands::{TemplateSummary, catalog_service},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(args: ListArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let category = args
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()
        .map_err(|e| CliError::InvalidInput {
            message: "unknown --category".into(),
            source: Some(Box::new(e)),
        })?;

    let templates: Vec<_> = catalog_service(config)
        .list()?
        .into_iter()
        .filter(|t| category.is_none_or(|c| t.category == c))
        .filter(|t| !args.schema_less || t.is_schema_less())
        .collect();

    if output.is_json() {
        let summaries: Vec<TemplateSummary<'_>> =
            templates.iter().map(TemplateSummary::from).collect();
        return output.json(&summaries);
    }

    output.header(&format!(
        "Templates in {} ({}):",
        config.catalog.templates_dir.display(),
        templates.len()
    ))?;
    for t in &templates {
        let mut line = format!("  {}  {}  [{}]", t.id, t.name, t.category);
        if t.is_schema_less() {
            line.push_str(&output.dim("  schema-less"));
        }
        output.data(&line)?;
    }

    Ok(())
}
