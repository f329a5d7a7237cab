//! `blockwright providers`: print how credentials route to providers.
//!
//! Nothing is sent; this only evaluates the routing rules against the
//! loaded configuration.

use serde::Serialize;

use blockwright_core::domain::{CredentialSource, ProviderKind, providers::mask};

use crate::{config::AppConfig, error::CliResult, output::OutputManager};

#[derive(Debug, Serialize)]
struct Route {
    provider: ProviderKind,
    source: Option<CredentialSource>,
    credential: Option<String>,
    model: String,
}

fn routes(config: &AppConfig) -> Vec<Route> {
    let registry = config.registry();
    let credentials = config.credentials();
    let models = config.models();

    registry
        .iter()
        .map(|kind| {
            let routed = credentials.route(kind, registry.providers());
            Route {
                provider: kind,
                source: routed.as_ref().map(|r| r.source),
                credential: routed.as_ref().map(|r| mask(&r.secret)),
                model: kind.select_model(&models),
            }
        })
        .collect()
}

pub fn execute(config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let routes = routes(config);

    if output.is_json() {
        return output.json(&routes);
    }

    output.header("Provider chain (fallback order):")?;
    for (i, route) in routes.iter().enumerate() {
        let credential = match (&route.credential, route.source) {
            (Some(masked), Some(source)) => format!("{masked} ({source})"),
            _ => output.dim("no credential, skipped"),
        };
        output.data(&format!(
            "  {}. {:<12} {:<28} {}",
            i + 1,
            route.provider.name(),
            credential,
            route.model
        ))?;
    }

    if routes.iter().all(|r| r.credential.is_none()) {
        output.warning("No provider has a credential; generation will fail")?;
    }
    Ok(())
}
