//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by reference.  The
//! CLI layer owns config; the core crate only sees the values built from it
//! ([`RetryPolicy`], [`ProviderRegistry`], [`CredentialSet`]).
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags ([`AppConfig::apply_overrides`])
//! 2. Environment variables: `BLOCKWRIGHT_<SECTION>__<KEY>`
//! 3. `--config FILE`, or else `.blockwright.toml` in the current directory
//!    layered over the per-user file at [`AppConfig::config_path`]
//! 4. Built-in defaults (always present)

use std::{
    collections::BTreeMap,
    path::PathBuf,
    time::Duration,
};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use blockwright_core::{
    domain::{GenerationParams, ProviderKind, providers::split_list},
    prelude::{CredentialSet, ProviderRegistry, RetryPolicy},
};

use crate::cli::global::GlobalArgs;

/// File name of the per-directory configuration.
pub const LOCAL_CONFIG_FILE: &str = ".blockwright.toml";

const ENV_PREFIX: &str = "BLOCKWRIGHT";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Template catalog settings.
    pub catalog: CatalogConfig,
    /// Provider credentials and generation parameters.
    pub providers: ProvidersConfig,
    /// Retry and deadline bounds for the provider chain.
    pub retry: RetryConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub templates_dir: PathBuf,
    /// Default result count for search, resolve, generate and compose.
    pub max_results: usize,
    /// Write generated sections back into `templates_dir`.
    pub write_through: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            max_results: 3,
            write_through: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Delimited credential pool, routed by prefix then position.
    pub api_keys: String,
    /// Delimited provider list; order is fallback order.
    pub enabled: String,
    /// Delimited preferred model names.
    pub models: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// `provider = "credential"`; wins over `api_keys`.
    pub credentials: BTreeMap<String, String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            api_keys: String::new(),
            enabled: ProviderKind::DEFAULT_ORDER
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(","),
            models: String::new(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            credentials: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub deadline_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: u64::try_from(policy.base_delay.as_millis()).unwrap_or(u64::MAX),
            deadline_secs: policy.deadline.as_secs(),
            request_timeout_secs: policy.request_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, files and the environment.
    ///
    /// `config_file` is the path passed via `--config`; it must exist.  The
    /// default locations are optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match config_file {
            Some(path) => {
                debug!(path = %path.display(), "using explicit config file");
                builder = builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(true));
            }
            None => {
                let global = Self::config_path();
                builder = builder
                    .add_source(File::new(&global.to_string_lossy(), FileFormat::Toml).required(false))
                    .add_source(File::new(LOCAL_CONFIG_FILE, FileFormat::Toml).required(false));
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Path to the per-user configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.blockwright.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "blockwright", "blockwright")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Apply flags that shadow configuration keys.
    pub fn apply_overrides(&mut self, args: &GlobalArgs) {
        if let Some(dir) = &args.templates_dir {
            self.catalog.templates_dir = dir.clone();
        }
        if args.no_color {
            self.output.no_color = true;
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            deadline: Duration::from_secs(self.retry.deadline_secs),
            request_timeout: Duration::from_secs(self.retry.request_timeout_secs),
        }
    }

    pub fn registry(&self) -> ProviderRegistry {
        ProviderRegistry::parse(&self.providers.enabled)
    }

    /// Credentials from the structured table and the delimited pool.
    ///
    /// Table entries naming an unknown provider are logged and ignored.
    pub fn credentials(&self) -> CredentialSet {
        let structured = self
            .providers
            .credentials
            .iter()
            .filter_map(|(name, secret)| match name.parse::<ProviderKind>() {
                Ok(kind) => Some((kind, secret.clone())),
                Err(error) => {
                    warn!(%error, "ignoring [providers.credentials] entry");
                    None
                }
            })
            .collect();

        CredentialSet::new(structured, &self.providers.api_keys)
    }

    pub fn models(&self) -> Vec<String> {
        split_list(&self.providers.models)
            .map(str::to_string)
            .collect()
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.providers.temperature,
            max_tokens: self.providers.max_tokens,
        }
    }
}
