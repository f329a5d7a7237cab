//! Embedded configuration blocks.
//!
//! A section body may carry one structured metadata block:
//!
//! ```text
//! <section class="hero">{{ heading }}</section>
//!
//! {% schema %}
//! {
//!   "name": "Hero banner",
//!   "settings": [{ "id": "heading", "type": "text", "default": "Welcome" }]
//! }
//! {% endschema %}
//! ```
//!
//! The payload is JSON. Whitespace-control variants (`{%- schema -%}`) are
//! accepted when reading; [`ConfigBlock::render`] always writes the plain
//! markers.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{entities::template::VariableDefinition, error::DomainError};

pub const BLOCK_OPEN: &str = "{% schema %}";
pub const BLOCK_CLOSE: &str = "{% endschema %}";

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{%-?\s*schema\s*-?%\}(.*?)\{%-?\s*endschema\s*-?%\}")
        .expect("block pattern is valid")
});

static OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*schema\s*-?%\}").expect("open pattern is valid"));

// ── Parsed payload ────────────────────────────────────────────────────────────

/// Deserialised block payload. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(default)]
    pub settings: Vec<SettingDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<Preset>,
}

/// One entry of `settings`. Informational entries (`header`, `paragraph`)
/// have no `id` and are not variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default = "default_setting_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

fn default_setting_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
}

impl ConfigBlock {
    /// Parse a block payload.
    ///
    /// # Errors
    ///
    /// `MalformedConfigBlock` when the payload is not a JSON object of the
    /// expected shape.
    pub fn parse(payload: &str) -> Result<Self, DomainError> {
        serde_json::from_str(payload.trim()).map_err(|e| DomainError::MalformedConfigBlock {
            reason: e.to_string(),
        })
    }

    /// Smallest block the editor accepts: a name and one preset.
    pub fn minimal(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            presets: vec![Preset {
                name: name.to_string(),
            }],
            ..Self::default()
        }
    }

    /// Declared settings that carry an `id`, keyed by that id.
    pub fn variable_definitions(&self) -> BTreeMap<String, VariableDefinition> {
        self.settings
            .iter()
            .filter_map(|setting| {
                let id = setting.id.as_ref()?.trim();
                (!id.is_empty()).then(|| {
                    (
                        id.to_string(),
                        VariableDefinition {
                            kind: setting.kind.clone(),
                            default: setting.default.clone(),
                            label: setting.label.clone(),
                            description: setting.info.clone(),
                        },
                    )
                })
            })
            .collect()
    }

    /// Render as a complete block with plain markers.
    pub fn render(&self) -> String {
        // A struct of strings, vectors and JSON values always serialises.
        let json = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        format!("{BLOCK_OPEN}\n{json}\n{BLOCK_CLOSE}")
    }
}

// ── Locating blocks ───────────────────────────────────────────────────────────

/// Byte ranges of one complete block inside a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// From the opening marker through the closing marker.
    pub outer: Range<usize>,
    /// The payload between the markers.
    pub payload: Range<usize>,
}

/// Every complete block in `text`, in order.
pub fn find_blocks(text: &str) -> Vec<BlockSpan> {
    BLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let outer = caps.get(0)?;
            let payload = caps.get(1)?;
            Some(BlockSpan {
                outer: outer.range(),
                payload: payload.range(),
            })
        })
        .collect()
}

/// Payload of the first complete block, if any.
pub fn extract(text: &str) -> Option<&str> {
    find_blocks(text)
        .first()
        .map(|span| &text[span.payload.clone()])
}

/// Remove every complete block from `text`.
pub fn strip_blocks(text: &str) -> String {
    BLOCK_RE.replace_all(text, "").into_owned()
}

/// Offset of an opening marker that is never closed (truncated output).
pub fn dangling_open(text: &str) -> Option<usize> {
    let after_last_block = find_blocks(text).last().map_or(0, |span| span.outer.end);
    OPEN_RE
        .find_at(text, after_last_block)
        .map(|m| m.start())
}

// ── Normalisation ─────────────────────────────────────────────────────────────

/// Result of [`ensure_single_block`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBody {
    pub body: String,
    pub block: ConfigBlock,
    /// `true` when the block was generated rather than found.
    pub synthesized: bool,
}

/// Guarantee that `body` carries exactly one parseable block.
///
/// - A dangling opener and everything after it is dropped.
/// - The first complete block is kept; later ones are removed.
/// - A missing or unparsable block is replaced by [`ConfigBlock::minimal`]
///   named `fallback_name`, appended at the end.
pub fn ensure_single_block(body: &str, fallback_name: &str) -> NormalizedBody {
    let mut text = match dangling_open(body) {
        Some(offset) => body[..offset].trim_end().to_string(),
        None => body.to_string(),
    };

    let spans = find_blocks(&text);
    let parsed = spans
        .first()
        .map(|span| ConfigBlock::parse(&text[span.payload.clone()]));

    match parsed {
        Some(Ok(block)) => {
            // Drop extra blocks back to front so earlier ranges stay valid.
            for span in spans.iter().skip(1).rev() {
                text.replace_range(span.outer.clone(), "");
            }
            NormalizedBody {
                body: text,
                block,
                synthesized: false,
            }
        }
        _ => {
            let markup = strip_blocks(&text);
            let block = ConfigBlock::minimal(fallback_name);
            let body = format!("{}\n\n{}\n", markup.trim_end(), block.render());
            NormalizedBody {
                body,
                block,
                synthesized: true,
            }
        }
    }
}
