//! Credential routing.
//!
//! Two inputs:
//!
//! - a structured `{provider: credential}` table (authoritative), and
//! - one delimited credential string (legacy), routed by heuristics.
//!
//! Per provider, first hit wins:
//!
//! 1. structured table entry
//! 2. pooled credential whose most specific prefix belongs to the provider
//! 3. pooled credential at the provider's position in the enabled list,
//!    unless another provider's prefix claims it
//! 4. first pooled credential that no provider's prefix claims
//!
//! Routing never fails. A provider with no credential is simply skipped by
//! the caller.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::providers::{ProviderKind, split_list};

/// Which routing rule produced a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Structured,
    Prefix,
    Positional,
    Unclaimed,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Structured => "structured",
            Self::Prefix => "prefix",
            Self::Positional => "positional",
            Self::Unclaimed => "unclaimed",
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct RoutedCredential {
    pub secret: String,
    pub source: CredentialSource,
}

impl fmt::Debug for RoutedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutedCredential")
            .field("secret", &mask(&self.secret))
            .field("source", &self.source)
            .finish()
    }
}

/// Provider whose longest matching prefix starts `credential`.
///
/// `sk-ant-…` belongs to Anthropic even though `sk-` is an OpenAI prefix.
pub fn claimed_by(credential: &str) -> Option<ProviderKind> {
    ProviderKind::DEFAULT_ORDER
        .iter()
        .flat_map(|kind| kind.key_prefixes().iter().map(move |p| (*kind, *p)))
        .filter(|(_, prefix)| credential.starts_with(prefix))
        .max_by_key(|(_, prefix)| prefix.len())
        .map(|(kind, _)| kind)
}

/// Show the first four characters and the last two, hide the rest.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}

/// All credentials known to one run.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    structured: BTreeMap<ProviderKind, String>,
    pooled: Vec<String>,
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("structured", &self.structured.keys().collect::<Vec<_>>())
            .field("pooled", &self.pooled.len())
            .finish()
    }
}

impl CredentialSet {
    /// Blank structured entries are ignored.
    pub fn new(structured: BTreeMap<ProviderKind, String>, delimited: &str) -> Self {
        Self {
            structured: structured
                .into_iter()
                .map(|(k, v)| (k, v.trim().to_string()))
                .filter(|(_, v)| !v.is_empty())
                .collect(),
            pooled: split_list(delimited).map(str::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.structured.is_empty() && self.pooled.is_empty()
    }

    /// Credential for `kind`, given the enabled provider order.
    pub fn route(&self, kind: ProviderKind, enabled: &[ProviderKind]) -> Option<RoutedCredential> {
        let routed = |secret: &String, source| RoutedCredential {
            secret: secret.clone(),
            source,
        };

        if let Some(secret) = self.structured.get(&kind) {
            return Some(routed(secret, CredentialSource::Structured));
        }

        if let Some(secret) = self.pooled.iter().find(|c| claimed_by(c) == Some(kind)) {
            return Some(routed(secret, CredentialSource::Prefix));
        }

        let positional = enabled
            .iter()
            .position(|k| *k == kind)
            .and_then(|index| self.pooled.get(index))
            .filter(|c| claimed_by(c).is_none());
        if let Some(secret) = positional {
            return Some(routed(secret, CredentialSource::Positional));
        }

        self.pooled
            .iter()
            .find(|c| claimed_by(c).is_none())
            .map(|secret| routed(secret, CredentialSource::Unclaimed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ProviderKind::*;

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(claimed_by("sk-ant-abc"), Some(Anthropic));
        assert_eq!(claimed_by("sk-proj-abc"), Some(OpenAi));
        assert_eq!(claimed_by("sk-abc"), Some(OpenAi));
        assert_eq!(claimed_by("gsk_abc"), Some(Groq));
        assert_eq!(claimed_by("AIzaSy"), Some(Gemini));
        assert_eq!(claimed_by("hf_abc"), Some(HuggingFace));
        assert_eq!(claimed_by("plainkey"), None);
    }

    #[test]
    fn structured_table_wins_over_pool() {
        let set = CredentialSet::new(
            BTreeMap::from([(OpenAi, "sk-structured".to_string())]),
            "sk-pooled",
        );
        let routed = set.route(OpenAi, &ProviderKind::DEFAULT_ORDER).unwrap();
        assert_eq!(routed.secret, "sk-structured");
        assert_eq!(routed.source, CredentialSource::Structured);
    }

    #[test]
    fn prefix_routing_ignores_position() {
        let set = CredentialSet::new(BTreeMap::new(), "sk-ant-a, gsk_b");
        let enabled = [Groq, Anthropic];
        assert_eq!(set.route(Groq, &enabled).unwrap().secret, "gsk_b");
        assert_eq!(set.route(Anthropic, &enabled).unwrap().secret, "sk-ant-a");
        assert_eq!(set.route(Anthropic, &enabled).unwrap().source, CredentialSource::Prefix);
    }

    #[test]
    fn positional_routing_skips_claimed_credentials() {
        let set = CredentialSet::new(BTreeMap::new(), "gsk_a plain-b");
        let enabled = [Gemini, HuggingFace];
        // index 0 is claimed by Groq, so Gemini falls through to the unclaimed rule
        let gemini = set.route(Gemini, &enabled).unwrap();
        assert_eq!(gemini.secret, "plain-b");
        assert_eq!(gemini.source, CredentialSource::Unclaimed);

        let hf = set.route(HuggingFace, &enabled).unwrap();
        assert_eq!(hf.secret, "plain-b");
        assert_eq!(hf.source, CredentialSource::Positional);
    }

    #[test]
    fn absence_is_none_not_error() {
        let set = CredentialSet::new(BTreeMap::new(), "gsk_only");
        assert!(set.route(OpenAi, &ProviderKind::DEFAULT_ORDER).is_none());
        assert!(CredentialSet::default().route(Groq, &[Groq]).is_none());
        assert!(CredentialSet::default().is_empty());
    }

    #[test]
    fn blank_structured_entries_are_ignored() {
        let set = CredentialSet::new(BTreeMap::from([(Groq, "  ".to_string())]), "");
        assert!(set.is_empty());
    }

    #[test]
    fn mask_hides_the_middle() {
        assert_eq!(mask("sk-ant-1234567890"), "sk-a…90");
        assert_eq!(mask("short"), "*****");
    }

    #[test]
    fn debug_never_prints_secrets() {
        let set = CredentialSet::new(BTreeMap::from([(Groq, "gsk_secret123".to_string())]), "x-secret-9");
        assert!(!format!("{set:?}").contains("secret"));
        let routed = set.route(Groq, &[Groq]).unwrap();
        assert!(!format!("{routed:?}").contains("secret123"));
    }
}
