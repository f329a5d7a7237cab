//! `blockwright init`: create a default configuration file.

use std::path::PathBuf;

use crate::{
    cli::InitArgs,
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

const HEADER: &str = "\
# Blockwright configuration.
# Every key can also be set from the environment, e.g.
#   BLOCKWRIGHT_PROVIDERS__API_KEYS=\"gsk_...,sk-...\"
#   BLOCKWRIGHT_CATALOG__TEMPLATES_DIR=./sections

";

/// Create a default Blockwright configuration file.
pub fn execute(args: InitArgs, output: &OutputManager) -> CliResult<()> {
    let config_path = if args.local {
        PathBuf::from(LOCAL_CONFIG_FILE)
    } else {
        AppConfig::config_path()
    };

    if config_path.exists() && !args.force && !confirm_overwrite(&config_path)? {
        return Err(CliError::ConfigExists { path: config_path });
    }

    output.info("Initialising configuration...")?;

    let body = toml::to_string_pretty(&AppConfig::default())
        .with_cli_context(|| "Failed to serialise default config")?;

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }

    std::fs::write(&config_path, format!("{HEADER}{body}"))
        .with_cli_context(|| format!("Failed to write config to '{}'", config_path.display()))?;

    output.success(&format!(
        "Configuration created at {}",
        config_path.display(),
    ))?;

    Ok(())
}

/// Ask before overwriting when attached to a terminal.
#[cfg(feature = "interactive")]
fn confirm_overwrite(path: &std::path::Path) -> CliResult<bool> {
    use std::io::IsTerminal as _;

    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }
    dialoguer::Confirm::new()
        .with_prompt(format!("{} exists. Overwrite?", path.display()))
        .default(false)
        .interact()
        .map_err(|e| CliError::InvalidInput {
            message: "confirmation prompt failed".into(),
            source: Some(Box::new(e)),
        })
}

#[cfg(not(feature = "interactive"))]
fn confirm_overwrite(_path: &std::path::Path) -> CliResult<bool> {
    Ok(false)
}
