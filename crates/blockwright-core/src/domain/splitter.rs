//! Turns one raw generated response into discrete, normalized artifacts.
//!
//! ## Pipeline
//!
//! ```text
//! raw text
//!   │ unfence (keep code-fence contents when present)
//!   ▼
//! segment ── 1. after each {% endschema %}
//!         ── 2. exactly one block: whole text
//!         ── 3. before top-level <section|<header|<footer|<article|<div
//!               at line start, once the previous container has closed
//!         ── 4. whole text
//!   │ first rule that applies wins
//!   ▼
//! per segment: strip fence lines → length check → name → single block → id
//! ```
//!
//! Segments that fail the length check are reported back as
//! [`DomainError::MalformedFragment`] and dropped. If nothing survives the
//! whole split fails with [`DomainError::NoUsableFragments`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::{
    common::slugify,
    config_block::{self, ConfigBlock},
    entities::template::{GeneratedArtifact, TemplateId},
    error::DomainError,
};

/// Minimum characters of markup (block excluded, trimmed) a segment needs.
pub const MIN_SEGMENT_LEN: usize = 40;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```").expect("fence pattern is valid")
});

static CONTAINER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/)?(?:section|header|footer|article|div)\b[^>]*>")
        .expect("container pattern is valid")
});

static HTML_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[1-3][^>]*>(.*?)</h[1-3]>").expect("heading pattern is valid")
});

static MD_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,3}[ \t]+(.+?)[ \t#]*$").expect("heading pattern is valid"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Artifacts that survived, plus what was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    pub artifacts: Vec<GeneratedArtifact>,
    /// One `MalformedFragment` per dropped segment.
    pub discarded: Vec<DomainError>,
}

/// Stateless splitter; the query only feeds default descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSplitter;

impl ResponseSplitter {
    pub fn new() -> Self {
        Self
    }

    /// Split `raw` into at most `max_results` artifacts.
    ///
    /// # Errors
    ///
    /// `NoUsableFragments` when every segment was discarded.
    pub fn split(
        &self,
        raw: &str,
        query: &str,
        max_results: usize,
    ) -> Result<SplitOutcome, DomainError> {
        let text = unfence(raw);
        let segments = segment(&text);
        debug!(segments = segments.len(), "segmented response");

        let mut artifacts = Vec::new();
        let mut discarded = Vec::new();

        for (position, segment) in segments.iter().enumerate() {
            match self.normalize(segment, query, artifacts.len() + 1) {
                Ok(artifact) => artifacts.push(artifact),
                Err(reason) => {
                    let error = DomainError::MalformedFragment {
                        index: position + 1,
                        reason,
                    };
                    warn!(%error, "dropping fragment");
                    discarded.push(error);
                }
            }
        }

        if artifacts.is_empty() {
            return Err(DomainError::NoUsableFragments {
                discarded: discarded.len(),
            });
        }

        artifacts.truncate(max_results.max(1));
        Ok(SplitOutcome {
            artifacts,
            discarded,
        })
    }

    /// Normalize one segment into artifact number `sequence` (1-based).
    fn normalize(
        &self,
        segment: &str,
        query: &str,
        sequence: usize,
    ) -> Result<GeneratedArtifact, String> {
        let cleaned = drop_fence_lines(segment);
        let cleaned = cleaned.trim();

        let markup_len = config_block::strip_blocks(cleaned).trim().chars().count();
        if markup_len < MIN_SEGMENT_LEN {
            return Err(format!(
                "{markup_len} characters of markup, need at least {MIN_SEGMENT_LEN}"
            ));
        }

        let declared = config_block::extract(cleaned).and_then(|p| ConfigBlock::parse(p).ok());
        let name = declared
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| first_heading(cleaned))
            .unwrap_or_else(|| format!("Generated Section {sequence}"));

        let normalized = config_block::ensure_single_block(cleaned, &name);
        let description = normalized
            .block
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Generated for: {}", query.trim()));

        Ok(GeneratedArtifact {
            id: artifact_id(&name, sequence),
            name,
            description,
            preview_ref: normalized.block.preview.clone(),
            body: normalized.body,
        })
    }
}

/// `slug(name)-sequence`, `section-sequence` when the name has no slug.
pub fn artifact_id(name: &str, sequence: usize) -> TemplateId {
    let slug = slugify(name);
    let base = if slug.is_empty() { "section" } else { slug.as_str() };
    TemplateId::from_slug(format!("{base}-{sequence}"))
}

/// Contents of every complete code fence, or the text unchanged if none.
fn unfence(raw: &str) -> String {
    let bodies: Vec<&str> = FENCE_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if bodies.is_empty() {
        raw.to_string()
    } else {
        bodies.join("\n")
    }
}

/// Remove stray fence marker lines left by a truncated or split fence.
fn drop_fence_lines(segment: &str) -> String {
    segment
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Apply the segmentation rules in priority order.
fn segment(text: &str) -> Vec<&str> {
    let by_block = split_after_blocks(text);
    if by_block.len() > 1 {
        return by_block;
    }
    if config_block::find_blocks(text).len() == 1 {
        return by_block;
    }
    let by_container = split_before_containers(text);
    if by_container.len() > 1 {
        return by_container;
    }
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![text]
    }
}

fn split_after_blocks(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for span in config_block::find_blocks(text) {
        pieces.push(&text[start..span.outer.end]);
        start = span.outer.end;
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.trim().is_empty());
    pieces
}

/// Cut before each line-start container opener at nesting depth zero.
///
/// Markup ahead of the first container (styles, scripts) stays with it, and
/// openers nested inside an unclosed container never cut.
fn split_before_containers(text: &str) -> Vec<&str> {
    let mut cuts = Vec::new();
    let mut depth = 0usize;
    let mut closed_since_cut = false;

    for caps in CONTAINER_TAG_RE.captures_iter(text) {
        let Some(tag) = caps.get(0) else { continue };
        if caps.get(1).is_some() {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                closed_since_cut = true;
            }
            continue;
        }

        let offset = tag.start();
        let at_line_start = offset > 0 && text[..offset].ends_with('\n');
        if depth == 0 && at_line_start && closed_since_cut {
            cuts.push(offset);
            closed_since_cut = false;
        }
        if !tag.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    cuts.push(text.len());

    let mut pieces = Vec::with_capacity(cuts.len());
    let mut start = 0;
    for cut in cuts {
        pieces.push(&text[start..cut]);
        start = cut;
    }
    pieces.retain(|p| !p.trim().is_empty());
    pieces
}

/// First h1-h3 (HTML or markdown) with inner tags removed.
fn first_heading(text: &str) -> Option<String> {
    let markup = config_block::strip_blocks(text);
    let html = HTML_HEADING_RE
        .captures(&markup)
        .and_then(|caps| caps.get(1))
        .map(|m| (m.start(), TAG_RE.replace_all(m.as_str(), "").trim().to_string()));
    let md = MD_HEADING_RE
        .captures(&markup)
        .and_then(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str().trim().to_string()));

    let heading = match (html, md) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a.1 } else { b.1 }),
        (a, b) => a.or(b).map(|(_, h)| h),
    }?;

    (!heading.is_empty() && !heading.contains("{{")).then_some(heading)
}
