//! `blockwright config`: inspect configuration values.
//!
//! Credentials are masked in every view.

use std::path::PathBuf;

use serde_json::Value;

use blockwright_core::domain::providers::{mask, split_list};

use crate::{
    cli::ConfigCommands,
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(
    cmd: ConfigCommands,
    explicit: Option<&PathBuf>,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let masked = masked(config);

    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(&masked, &key)?;
            if output.is_json() {
                return output.json(&value);
            }
            output.data(&render(&value))?;
        }

        ConfigCommands::List => {
            if output.is_json() {
                return output.json(&masked);
            }
            output.header("Current Configuration:")?;
            let serialised = toml::to_string_pretty(&masked)
                .with_cli_context(|| "Failed to serialise config")?;
            output.data(serialised.trim_end())?;
        }

        ConfigCommands::Path => {
            output.data(&active_path(explicit).display().to_string())?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

/// The file that wins: `--config`, then the local file, then the user file.
fn active_path(explicit: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path.clone();
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        local
    } else {
        AppConfig::config_path()
    }
}

fn masked(config: &AppConfig) -> AppConfig {
    let mut masked = config.clone();
    masked.providers.api_keys = split_list(&config.providers.api_keys)
        .map(mask)
        .collect::<Vec<_>>()
        .join(",");
    for secret in masked.providers.credentials.values_mut() {
        *secret = mask(secret);
    }
    masked
}

fn get_config_value(config: &AppConfig, key: &str) -> CliResult<Value> {
    let root = serde_json::to_value(config)?;
    key.split('.')
        .try_fold(&root, |node, part| node.get(part))
        .cloned()
        .ok_or_else(|| CliError::UnknownConfigKey {
            key: key.to_string(),
        })
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
