//! Simple placeholder substitution assembler.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::{Captures, Regex};
use tracing::instrument;

use blockwright_core::{application::ports::Assembler, domain::Template};

/// `{{ name }}` or `{{name}}`. Dotted paths and filters are Liquid, not ours.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Assembler using basic variable substitution.
///
/// Overrides win over declared defaults. Placeholders with neither are left
/// untouched so the storefront can still resolve them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAssembler;

impl PlaceholderAssembler {
    /// Create a new assembler.
    pub fn new() -> Self {
        Self
    }
}

impl Assembler for PlaceholderAssembler {
    #[instrument(skip_all, fields(id = %template.id))]
    fn assemble(&self, template: &Template, overrides: &BTreeMap<String, String>) -> String {
        PLACEHOLDER_RE
            .replace_all(&template.body, |caps: &Captures<'_>| {
                let name = &caps[1];
                overrides
                    .get(name)
                    .cloned()
                    .or_else(|| template.variables.get(name)?.default_text())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}
