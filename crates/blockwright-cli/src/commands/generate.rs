//! `blockwright generate`: new sections from the provider chain.

use tracing::{info, instrument};

use crate::{
    cli::GenerateArgs,
    commands::{build_request, emit_artifacts, generation_service},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all)]
pub async fn execute(
    args: GenerateArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let request = build_request(&args.text, args.count, &args.exclude.exclude, config)?;
    let service = generation_service(config, args.no_persist)?;

    let spinner = output.spinner("Generating sections");
    let result = service.generate(&request).await;
    spinner.finish_and_clear();
    let report = result?;

    info!(
        run_id = %report.run_id,
        provider = %report.provider,
        artifacts = report.artifacts.len(),
        "generation finished"
    );

    if output.is_json() {
        return output.json(&report);
    }

    for failure in &report.failed_providers {
        output.warning(&format!("skipped {failure}"))?;
    }
    for dropped in &report.discarded {
        output.warning(&format!("dropped segment: {dropped}"))?;
    }
    for warning in &report.warnings {
        output.warning(&warning.to_string())?;
    }

    output.success(&format!(
        "{} section(s) from {} ({})",
        report.artifacts.len(),
        report.provider,
        report.model
    ))?;
    emit_artifacts(output, &report.artifacts, args.out_dir.as_deref())
}
