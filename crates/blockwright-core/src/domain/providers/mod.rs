//! Generation backends: identity, model choice and wire request shape.
//!
//! ```text
//! ProviderRegistry (ordered = fallback order)
//!   ├── Groq         chat       Bearer          gsk_
//!   ├── OpenAi       chat       Bearer          sk-, sk-proj-
//!   ├── Anthropic    messages   x-api-key       sk-ant-
//!   ├── Gemini       contents   x-goog-api-key  AIza
//!   └── HuggingFace  prompt     Bearer          hf_
//! ```
//!
//! Everything here is pure: building a [`ProviderRequest`] never touches the
//! network, and [`extract_text`] only reads an already-decoded body.

pub mod credentials;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::domain::error::DomainError;

pub use credentials::{CredentialSet, CredentialSource, RoutedCredential, claimed_by, mask};

// ============================================================================
// Provider identity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    OpenAi,
    Anthropic,
    Gemini,
    HuggingFace,
}

impl ProviderKind {
    pub const DEFAULT_ORDER: [ProviderKind; 5] = [
        ProviderKind::Groq,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::HuggingFace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::HuggingFace => "huggingface",
        }
    }

    /// Credential prefixes issued by this provider.
    pub fn key_prefixes(self) -> &'static [&'static str] {
        match self {
            Self::Groq => &["gsk_"],
            Self::OpenAi => &["sk-", "sk-proj-"],
            Self::Anthropic => &["sk-ant-"],
            Self::Gemini => &["AIza"],
            Self::HuggingFace => &["hf_"],
        }
    }

    /// Substrings that mark a configured model name as belonging here.
    pub fn family_markers(self) -> &'static [&'static str] {
        match self {
            Self::Groq => &["llama", "mixtral", "gemma", "qwen", "deepseek"],
            Self::OpenAi => &["gpt-", "o1-", "o3-"],
            Self::Anthropic => &["claude"],
            Self::Gemini => &["gemini"],
            Self::HuggingFace => &["/"],
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Groq => "llama-3.3-70b-versatile",
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Gemini => "gemini-1.5-flash",
            Self::HuggingFace => "mistralai/Mistral-7B-Instruct-v0.3",
        }
    }

    /// First configured model carrying one of this provider's markers,
    /// otherwise [`default_model`](Self::default_model).
    pub fn select_model(self, configured: &[String]) -> String {
        configured
            .iter()
            .map(|m| m.trim())
            .find(|model| {
                let lower = model.to_lowercase();
                self.family_markers().iter().any(|marker| lower.contains(marker))
            })
            .unwrap_or(self.default_model())
            .to_string()
    }

    fn endpoint(self, model: &str) -> String {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1/chat/completions".into(),
            Self::OpenAi => "https://api.openai.com/v1/chat/completions".into(),
            Self::Anthropic => "https://api.anthropic.com/v1/messages".into(),
            Self::Gemini => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
            ),
            Self::HuggingFace => format!("https://api-inference.huggingface.co/models/{model}"),
        }
    }

    fn auth_headers(self, credential: &str) -> Vec<(&'static str, String)> {
        match self {
            Self::Anthropic => vec![
                ("x-api-key", credential.to_string()),
                ("anthropic-version", "2023-06-01".to_string()),
            ],
            Self::Gemini => vec![("x-goog-api-key", credential.to_string())],
            _ => vec![("authorization", format!("Bearer {credential}"))],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" | "open-ai" | "gpt" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            "huggingface" | "hugging-face" | "hf" => Ok(Self::HuggingFace),
            _ => Err(DomainError::UnknownProvider(s.trim().to_string())),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered list of enabled providers. Order is fallback order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRegistry {
    providers: Vec<ProviderKind>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self {
            providers: ProviderKind::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderKind>) -> Self {
        Self { providers }
    }

    /// Parse a delimited provider list (`"openai, groq"`).
    ///
    /// Unknown names are logged and skipped, duplicates keep their first
    /// position. A blank string, or one naming nothing known, yields the
    /// default order.
    pub fn parse(enabled: &str) -> Self {
        let mut providers = Vec::new();
        for name in split_list(enabled) {
            match name.parse::<ProviderKind>() {
                Ok(kind) if !providers.contains(&kind) => providers.push(kind),
                Ok(_) => {}
                Err(error) => warn!(%error, "ignoring provider"),
            }
        }

        if providers.is_empty() {
            Self::default()
        } else {
            Self { providers }
        }
    }

    pub fn providers(&self) -> &[ProviderKind] {
        &self.providers
    }

    pub fn iter(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.providers.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Split a delimited configuration string on commas, semicolons and
/// whitespace.
pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|part| !part.is_empty())
}

// ============================================================================
// Requests
// ============================================================================

/// The text sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Sampling parameters shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

/// A fully built HTTP request for one provider.
#[derive(Clone, PartialEq)]
pub struct ProviderRequest {
    pub provider: ProviderKind,
    pub model: String,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, _)| (*name, "<redacted>"))
            .collect();
        f.debug_struct("ProviderRequest")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("url", &self.url)
            .field("headers", &headers)
            .finish_non_exhaustive()
    }
}

impl ProviderRequest {
    /// Build the wire request for `kind`.
    pub fn build(
        kind: ProviderKind,
        model: &str,
        credential: &str,
        prompt: &Prompt,
        params: GenerationParams,
    ) -> Self {
        let body = match kind {
            ProviderKind::Groq | ProviderKind::OpenAi => json!({
                "model": model,
                "messages": [
                    { "role": "system", "content": prompt.system },
                    { "role": "user", "content": prompt.user },
                ],
                "temperature": params.temperature,
                "max_tokens": params.max_tokens,
            }),
            ProviderKind::Anthropic => json!({
                "model": model,
                "system": prompt.system,
                "messages": [{ "role": "user", "content": prompt.user }],
                "temperature": params.temperature,
                "max_tokens": params.max_tokens,
            }),
            ProviderKind::Gemini => json!({
                "systemInstruction": { "parts": [{ "text": prompt.system }] },
                "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
                "generationConfig": {
                    "temperature": params.temperature,
                    "maxOutputTokens": params.max_tokens,
                },
            }),
            ProviderKind::HuggingFace => json!({
                "inputs": format!("{}\n\n{}", prompt.system, prompt.user),
                "parameters": {
                    "temperature": params.temperature,
                    "max_new_tokens": params.max_tokens,
                    "return_full_text": false,
                },
            }),
        };

        Self {
            provider: kind,
            model: model.to_string(),
            url: kind.endpoint(model),
            headers: kind.auth_headers(credential),
            body,
        }
    }
}

/// Pull the generated text out of a decoded response body.
///
/// Returns `None` for unexpected shapes and for blank text.
pub fn extract_text(kind: ProviderKind, body: &Value) -> Option<String> {
    let text = match kind {
        ProviderKind::Groq | ProviderKind::OpenAi => body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string),
        ProviderKind::Anthropic => Some(join_text(body.get("content")?, "text")),
        ProviderKind::Gemini => Some(join_text(
            body.pointer("/candidates/0/content/parts")?,
            "text",
        )),
        ProviderKind::HuggingFace => body
            .pointer("/0/generated_text")
            .or_else(|| body.get("generated_text"))
            .and_then(Value::as_str)
            .map(str::to_string),
    }?;

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Concatenate `key` of every element in a JSON array.
fn join_text(parts: &Value, key: &str) -> String {
    parts
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(key).and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> Prompt {
        Prompt {
            system: "You write sections.".into(),
            user: "A hero banner".into(),
        }
    }

    #[test]
    fn registry_parses_in_given_order() {
        let registry = ProviderRegistry::parse("anthropic, groq;hf");
        assert_eq!(
            registry.providers(),
            &[ProviderKind::Anthropic, ProviderKind::Groq, ProviderKind::HuggingFace]
        );
    }

    #[test]
    fn registry_skips_unknown_and_duplicates() {
        let registry = ProviderRegistry::parse("groq, mystery, groq, openai");
        assert_eq!(registry.providers(), &[ProviderKind::Groq, ProviderKind::OpenAi]);
    }

    #[test]
    fn registry_defaults_when_nothing_usable() {
        assert_eq!(ProviderRegistry::parse(""), ProviderRegistry::default());
        assert_eq!(ProviderRegistry::parse("nope"), ProviderRegistry::default());
        assert_eq!(ProviderRegistry::default().len(), 5);
    }

    #[test]
    fn unknown_provider_name_is_an_error() {
        assert_eq!(
            "bard".parse::<ProviderKind>(),
            Err(DomainError::UnknownProvider("bard".into()))
        );
    }

    #[test]
    fn model_selection_prefers_matching_family() {
        let configured = vec![
            "claude-3-opus".to_string(),
            "gpt-4o".to_string(),
            "llama-3.1-8b-instant".to_string(),
        ];
        assert_eq!(ProviderKind::OpenAi.select_model(&configured), "gpt-4o");
        assert_eq!(ProviderKind::Anthropic.select_model(&configured), "claude-3-opus");
        assert_eq!(ProviderKind::Groq.select_model(&configured), "llama-3.1-8b-instant");
        assert_eq!(ProviderKind::Gemini.select_model(&configured), "gemini-1.5-flash");
    }

    #[test]
    fn chat_request_shape() {
        let req = ProviderRequest::build(
            ProviderKind::OpenAi,
            "gpt-4o-mini",
            "sk-test",
            &prompt(),
            GenerationParams::default(),
        );
        assert_eq!(req.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(req.headers, vec![("authorization", "Bearer sk-test".to_string())]);
        assert_eq!(req.body["messages"][1]["content"], "A hero banner");
        assert_eq!(req.body["max_tokens"], 4096);
    }

    #[test]
    fn single_prompt_request_shape() {
        let req = ProviderRequest::build(
            ProviderKind::HuggingFace,
            "org/model",
            "hf_x",
            &prompt(),
            GenerationParams::default(),
        );
        assert!(req.url.ends_with("/models/org/model"));
        assert!(req.body["inputs"].as_str().unwrap().contains("A hero banner"));
        assert!(req.body.get("messages").is_none());
    }

    #[test]
    fn gemini_and_anthropic_use_their_own_headers() {
        let gemini = ProviderRequest::build(
            ProviderKind::Gemini,
            "gemini-1.5-flash",
            "AIzaKey",
            &prompt(),
            GenerationParams::default(),
        );
        assert_eq!(gemini.headers[0].0, "x-goog-api-key");
        assert!(gemini.url.contains("gemini-1.5-flash:generateContent"));

        let anthropic = ProviderRequest::build(
            ProviderKind::Anthropic,
            "claude-3-5-haiku-latest",
            "sk-ant-k",
            &prompt(),
            GenerationParams::default(),
        );
        assert_eq!(anthropic.headers[0], ("x-api-key", "sk-ant-k".to_string()));
        assert_eq!(anthropic.body["system"], "You write sections.");
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let req = ProviderRequest::build(
            ProviderKind::Groq,
            "llama-3.3-70b-versatile",
            "gsk_secret",
            &prompt(),
            GenerationParams::default(),
        );
        assert!(!format!("{req:?}").contains("gsk_secret"));
    }

    #[test]
    fn extract_text_per_provider() {
        let openai = json!({ "choices": [{ "message": { "content": " hi " } }] });
        assert_eq!(extract_text(ProviderKind::OpenAi, &openai).as_deref(), Some("hi"));

        let anthropic = json!({ "content": [{ "type": "text", "text": "a" }, { "type": "text", "text": "b" }] });
        assert_eq!(extract_text(ProviderKind::Anthropic, &anthropic).as_deref(), Some("ab"));

        let gemini = json!({ "candidates": [{ "content": { "parts": [{ "text": "g" }] } }] });
        assert_eq!(extract_text(ProviderKind::Gemini, &gemini).as_deref(), Some("g"));

        let hf = json!([{ "generated_text": "h" }]);
        assert_eq!(extract_text(ProviderKind::HuggingFace, &hf).as_deref(), Some("h"));
    }

    #[test]
    fn extract_text_rejects_blank_and_unexpected() {
        let blank = json!({ "choices": [{ "message": { "content": "   " } }] });
        assert_eq!(extract_text(ProviderKind::Groq, &blank), None);
        assert_eq!(extract_text(ProviderKind::Anthropic, &json!({ "error": "x" })), None);
    }
}
