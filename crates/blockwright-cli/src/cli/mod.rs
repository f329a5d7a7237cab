//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "blockwright",
    bin_name = "blockwright",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Find page sections in your catalog, or generate new ones",
    long_about = "Blockwright ranks a catalog of Liquid/HTML section templates against \
                  a free-text request and, when nothing fits, asks a chain of LLM \
                  providers to write new sections with a valid schema block.",
    after_help = "EXAMPLES:\n\
        \x20 blockwright search \"hero banner with video\"\n\
        \x20 blockwright compose \"hero-banner-1, product-grid-1\" --set heading=\"Spring Sale\"\n\
        \x20 blockwright generate \"pricing table with three tiers\" --count 2\n\
        \x20 blockwright providers",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank catalog templates against a query.
    #[command(
        visible_alias = "s",
        about = "Rank catalog templates against a query",
        after_help = "EXAMPLES:\n\
            \x20 blockwright search testimonial\n\
            \x20 blockwright search \"grid of products\" --limit 10 --exclude product-grid-1"
    )]
    Search(SearchArgs),

    /// Resolve explicit references or a prose request against the catalog.
    #[command(
        about = "Resolve references or prose against the catalog",
        after_help = "EXAMPLES:\n\
            \x20 blockwright resolve \"hero-banner-1, Product Grid\"\n\
            \x20 blockwright resolve \"I need a hero with a video background\""
    )]
    Resolve(ResolveArgs),

    /// Generate new sections with the provider chain.
    #[command(
        visible_alias = "gen",
        about = "Generate new sections with LLM providers",
        after_help = "EXAMPLES:\n\
            \x20 blockwright generate \"FAQ accordion\" --count 2\n\
            \x20 blockwright generate \"newsletter signup\" --out-dir ./sections --no-persist"
    )]
    Generate(GenerateArgs),

    /// Catalog first, generation as fallback.
    #[command(
        about = "Produce finished sections from the catalog or by generation",
        after_help = "EXAMPLES:\n\
            \x20 blockwright compose \"hero-banner-1\" --set heading=\"Welcome\"\n\
            \x20 blockwright compose \"testimonials carousel\" --source catalog\n\
            \x20 blockwright compose \"team members grid\" --source generate --out-dir ./sections"
    )]
    Compose(ComposeArgs),

    /// List catalog templates.
    #[command(
        visible_alias = "ls",
        about = "List catalog templates",
        after_help = "EXAMPLES:\n\
            \x20 blockwright list\n\
            \x20 blockwright list --category hero\n\
            \x20 blockwright --output-format json list"
    )]
    List(ListArgs),

    /// Show how credentials route to providers.
    #[command(about = "Show the provider routing table (no requests are sent)")]
    Providers,

    /// Initialise a Blockwright configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 blockwright init           # default location\n\
            \x20 blockwright init --local   # .blockwright.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 blockwright completions bash > ~/.local/share/bash-completion/completions/blockwright\n\
            \x20 blockwright completions zsh  > ~/.zfunc/_blockwright\n\
            \x20 blockwright completions fish > ~/.config/fish/completions/blockwright.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Blockwright configuration.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 blockwright config get retry.max_attempts\n\
            \x20 blockwright config list\n\
            \x20 blockwright config path"
    )]
    Config(ConfigCommands),
}

// ── shared request flags ──────────────────────────────────────────────────────

/// Exclusion list shared by every catalog/generation command.
#[derive(Debug, Default, Args)]
pub struct ExcludeArgs {
    /// Template ids that must not appear in the result.
    #[arg(
        short = 'x',
        long = "exclude",
        value_name = "ID",
        value_delimiter = ',',
        help = "Template ids to leave out (repeatable or comma-separated)"
    )]
    pub exclude: Vec<String>,
}

// ── search ────────────────────────────────────────────────────────────────────

/// Arguments for `blockwright search`.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text query.
    #[arg(value_name = "QUERY", required = true, num_args = 1.., help = "Search query")]
    pub query: Vec<String>,

    /// Maximum number of results.
    #[arg(short = 'n', long = "limit", value_name = "N", help = "Maximum results [default: catalog.max_results]")]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub exclude: ExcludeArgs,
}

// ── resolve ───────────────────────────────────────────────────────────────────

/// Arguments for `blockwright resolve`.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Comma/newline separated references, or one prose request.
    #[arg(value_name = "TEXT", help = "References or request text")]
    pub text: String,

    #[arg(short = 'n', long = "limit", value_name = "N", help = "Maximum results [default: catalog.max_results]")]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub exclude: ExcludeArgs,
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `blockwright generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// What to generate.
    #[arg(value_name = "TEXT", help = "Request text")]
    pub text: String,

    /// Number of sections to ask for.
    #[arg(short = 'n', long = "count", value_name = "N", help = "Sections to generate [default: catalog.max_results]")]
    pub count: Option<usize>,

    #[command(flatten)]
    pub exclude: ExcludeArgs,

    /// Do not write generated sections back into the catalog.
    #[arg(long = "no-persist", help = "Skip write-through to the catalog")]
    pub no_persist: bool,

    /// Write each section to `<DIR>/<id>.liquid` instead of stdout.
    #[arg(short = 'o', long = "out-dir", value_name = "DIR", help = "Write sections to DIR")]
    pub out_dir: Option<PathBuf>,
}

// ── compose ───────────────────────────────────────────────────────────────────

/// Arguments for `blockwright compose`.
#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// Comma/newline separated references, or one prose request.
    #[arg(value_name = "TEXT", help = "References or request text")]
    pub text: String,

    /// Where sections may come from.
    #[arg(
        short = 's',
        long = "source",
        value_enum,
        default_value = "auto",
        help = "Section source"
    )]
    pub source: Source,

    #[arg(short = 'n', long = "count", value_name = "N", help = "Maximum sections [default: catalog.max_results]")]
    pub count: Option<usize>,

    #[command(flatten)]
    pub exclude: ExcludeArgs,

    /// Placeholder overrides for catalog sections.
    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        help = "Override a placeholder value (repeatable)"
    )]
    pub set: Vec<(String, String)>,

    #[arg(long = "no-persist", help = "Skip write-through of generated sections")]
    pub no_persist: bool,

    #[arg(short = 'o', long = "out-dir", value_name = "DIR", help = "Write sections to DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Section source for `compose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// Catalog first, generation when nothing matches.
    Auto,
    /// Catalog only.
    Catalog,
    /// Generation only.
    Generate,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `blockwright list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only templates in this category.
    #[arg(long = "category", value_name = "CATEGORY", help = "Filter by category (hero, footer, faq, ...)")]
    pub category: Option<String>,

    /// Only templates without a configuration block.
    #[arg(long = "schema-less", help = "Show only templates missing a schema block")]
    pub schema_less: bool,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `blockwright init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.blockwright.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `blockwright completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `blockwright config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `retry.max_attempts`.
        key: String,
    },
    /// Print all configuration values (credentials masked).
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_joins_words() {
        let cli = Cli::parse_from(["blockwright", "search", "hero", "banner", "-n", "2"]);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, ["hero", "banner"]);
                assert_eq!(args.limit, Some(2));
            }
            other => panic!("expected Search, got {other:?}"),
        }
    }

    #[test]
    fn exclude_accepts_commas_and_repeats() {
        let cli = Cli::parse_from([
            "blockwright",
            "resolve",
            "hero",
            "-x",
            "a,b",
            "--exclude",
            "c",
        ]);
        match cli.command {
            Commands::Resolve(args) => assert_eq!(args.exclude.exclude, ["a", "b", "c"]),
            other => panic!("expected Resolve, got {other:?}"),
        }
    }

    #[test]
    fn compose_parses_overrides_and_source() {
        let cli = Cli::parse_from([
            "blockwright",
            "compose",
            "hero-banner-1",
            "--source",
            "catalog",
            "--set",
            "heading=Hello = World",
        ]);
        match cli.command {
            Commands::Compose(args) => {
                assert_eq!(args.source, Source::Catalog);
                assert_eq!(args.set, [("heading".to_string(), "Hello = World".to_string())]);
            }
            other => panic!("expected Compose, got {other:?}"),
        }
    }

    #[test]
    fn malformed_override_is_rejected() {
        assert!(Cli::try_parse_from(["blockwright", "compose", "x", "--set", "novalue"]).is_err());
        assert!(parse_key_value("=v").is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["blockwright", "--quiet", "--verbose", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["blockwright", "list", "--templates-dir", "/tmp/t", "-vv"]);
        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.templates_dir, Some(PathBuf::from("/tmp/t")));
    }
}
