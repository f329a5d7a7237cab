//! Lexical ranking of catalog templates against a free-text query.
//!
//! ## Two passes
//!
//! 1. **Strict pass**: independent weighted rules, highest weight for the
//!    most precise signal (identifier hit) down to the weakest (description
//!    hit), plus a once-per-query exact-phrase bonus.
//! 2. **Lenient pass**: only when every strict score is zero. Scores raw
//!    substring overlap between query tokens and identifier segments, so a
//!    query that shares *anything* with an identifier still gets an answer.
//!
//! Precision first, recall as a fallback, never silently empty when any
//! overlap exists.
//!
//! ## Ordering
//!
//! Results are sorted by descending score with a stable sort, so equal
//! scores keep catalog iteration order.

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::{
    common::slugify,
    entities::template::{ScoredCandidate, Template, TemplateId},
};

// ── Weights ───────────────────────────────────────────────────────────────────

pub const WEIGHT_IDENTIFIER: u32 = 30;
pub const WEIGHT_PLURAL_VARIANT: u32 = 25;
pub const WEIGHT_CATEGORY_SYNONYM: u32 = 20;
pub const WEIGHT_NAME: u32 = 10;
pub const WEIGHT_BODY: u32 = 8;
pub const WEIGHT_DESCRIPTION: u32 = 5;

pub const BONUS_PHRASE_IS_IDENTIFIER: u32 = 15;
pub const BONUS_PHRASE_IN_IDENTIFIER: u32 = 12;
pub const BONUS_PHRASE_IN_DESCRIPTION: u32 = 10;

pub const LENIENT_TOKEN_CONTAINS_SEGMENT: u32 = 5;
pub const LENIENT_SHARED_SUBSTRING: u32 = 3;

/// Shortest common substring the lenient pass counts as overlap.
const LENIENT_MIN_OVERLAP: usize = 3;

/// Words that never carry intent in a section request.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "with", "for", "from", "into", "that", "this", "these", "those", "some", "any",
    "are", "was", "were", "has", "have", "had", "can", "could", "would", "should", "will", "want",
    "need", "needs", "like", "please", "make", "create", "build", "give", "show", "using", "use",
    "our", "your", "their", "its", "but", "not", "all", "also", "just", "very", "section",
    "sections", "component", "components", "block", "page",
];

// ── Tokenisation ──────────────────────────────────────────────────────────────

/// Lowercase, split on whitespace, drop short tokens and stop words.
///
/// If nothing survives, the whole lowercased (trimmed) query becomes the
/// single token. An all-whitespace query yields no tokens at all.
pub fn tokenize(query: &str) -> Vec<String> {
    let lower = query.trim().to_lowercase();
    if lower.is_empty() {
        return Vec::new();
    }

    let tokens: Vec<String> = lower
        .split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
        .filter(|t| t.chars().count() > 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect();

    if tokens.is_empty() {
        vec![lower]
    } else {
        tokens
    }
}

/// Singular/plural forms to try against the identifier.
fn plural_variants(token: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(3);
    if let Some(stem) = token.strip_suffix("ies") {
        if !stem.is_empty() {
            variants.push(format!("{stem}y"));
        }
    }
    if let Some(stem) = token.strip_suffix('s') {
        if stem.chars().count() > 2 {
            variants.push(stem.to_string());
        }
    }
    variants.push(format!("{token}s"));
    variants
}

/// `true` when `a` and `b` share a substring of at least `min` characters.
fn shares_substring(a: &str, b: &str, min: usize) -> bool {
    let chars: Vec<char> = b.chars().collect();
    chars
        .windows(min)
        .any(|window| a.contains(&window.iter().collect::<String>()))
}

// ── Port ──────────────────────────────────────────────────────────────────────

/// Anything that can order a catalog for a query.
///
/// The resolver depends on this trait, not on [`LexicalRanker`], so tests
/// can observe whether ranking happened at all.
#[cfg_attr(test, mockall::automock)]
pub trait Ranker: Send + Sync {
    /// Score `catalog` against `query`, skipping `exclude`, best first, at
    /// most `limit` entries, zero scores dropped.
    fn rank(
        &self,
        query: &str,
        catalog: &[Template],
        exclude: &BTreeSet<TemplateId>,
        limit: usize,
    ) -> Vec<ScoredCandidate>;
}

// ── Lexical ranker ────────────────────────────────────────────────────────────

/// Lowercased views of one template, computed once per ranking call.
struct Haystack<'a> {
    template: &'a Template,
    id: &'a str,
    name: String,
    markup: String,
    description: String,
}

impl<'a> Haystack<'a> {
    fn new(template: &'a Template) -> Self {
        Self {
            template,
            id: template.id.as_str(),
            name: template.name.to_lowercase(),
            markup: template.markup().to_lowercase(),
            description: template.description.to_lowercase(),
        }
    }
}

/// Default [`Ranker`]: weighted token rules with a lenient fallback pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalRanker;

impl LexicalRanker {
    pub fn new() -> Self {
        Self
    }

    fn strict_score(tokens: &[String], phrase: &str, hay: &Haystack<'_>) -> (u32, Vec<String>) {
        let mut score = 0;
        let mut reasons = Vec::new();

        for token in tokens {
            if hay.id.contains(token.as_str()) {
                score += WEIGHT_IDENTIFIER;
                reasons.push(format!("id:{token}"));
            } else if let Some(variant) = plural_variants(token)
                .into_iter()
                .find(|v| hay.id.contains(v.as_str()))
            {
                score += WEIGHT_PLURAL_VARIANT;
                reasons.push(format!("id~{variant}"));
            }

            if hay.template.category.is_synonym(token) {
                score += WEIGHT_CATEGORY_SYNONYM;
                reasons.push(format!("category:{token}"));
            }
            if hay.name.contains(token.as_str()) {
                score += WEIGHT_NAME;
                reasons.push(format!("name:{token}"));
            }
            if hay.markup.contains(token.as_str()) {
                score += WEIGHT_BODY;
                reasons.push(format!("body:{token}"));
            }
            if hay.description.contains(token.as_str()) {
                score += WEIGHT_DESCRIPTION;
                reasons.push(format!("description:{token}"));
            }
        }

        if let Some((bonus, reason)) = Self::phrase_bonus(phrase, hay) {
            score += bonus;
            reasons.push(reason);
        }

        (score, reasons)
    }

    /// Once-per-query bonus for the whole phrase.
    fn phrase_bonus(phrase: &str, hay: &Haystack<'_>) -> Option<(u32, String)> {
        if phrase.is_empty() {
            return None;
        }
        let slug = slugify(phrase);

        if phrase == hay.id || slug == hay.id {
            Some((BONUS_PHRASE_IS_IDENTIFIER, "phrase=id".into()))
        } else if hay.id.contains(phrase) || (!slug.is_empty() && hay.id.contains(slug.as_str())) {
            Some((BONUS_PHRASE_IN_IDENTIFIER, "phrase in id".into()))
        } else if hay.description.contains(phrase) {
            Some((BONUS_PHRASE_IN_DESCRIPTION, "phrase in description".into()))
        } else {
            None
        }
    }

    fn lenient_score(tokens: &[String], hay: &Haystack<'_>) -> (u32, Vec<String>) {
        let mut score = 0;
        let mut reasons = Vec::new();

        for token in tokens {
            for segment in hay.template.id.segments() {
                if segment.len() >= LENIENT_MIN_OVERLAP && token.contains(segment) {
                    score += LENIENT_TOKEN_CONTAINS_SEGMENT;
                    reasons.push(format!("lenient:{token}>{segment}"));
                } else if shares_substring(token, segment, LENIENT_MIN_OVERLAP) {
                    score += LENIENT_SHARED_SUBSTRING;
                    reasons.push(format!("lenient:{token}~{segment}"));
                }
            }
        }

        (score, reasons)
    }
}

impl Ranker for LexicalRanker {
    fn rank(
        &self,
        query: &str,
        catalog: &[Template],
        exclude: &BTreeSet<TemplateId>,
        limit: usize,
    ) -> Vec<ScoredCandidate> {
        let tokens = tokenize(query);
        if tokens.is_empty() || limit == 0 {
            return Vec::new();
        }
        let phrase = query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

        let haystacks: Vec<Haystack<'_>> = catalog
            .iter()
            .filter(|t| !exclude.contains(&t.id))
            .map(Haystack::new)
            .collect();

        let mut scored: Vec<(u32, Vec<String>, &Haystack<'_>)> = haystacks
            .iter()
            .map(|hay| {
                let (score, reasons) = Self::strict_score(&tokens, &phrase, hay);
                (score, reasons, hay)
            })
            .collect();

        let lenient = scored.iter().all(|(score, _, _)| *score == 0);
        if lenient {
            scored = haystacks
                .iter()
                .map(|hay| {
                    let (score, reasons) = Self::lenient_score(&tokens, hay);
                    (score, reasons, hay)
                })
                .collect();
        }

        scored.retain(|(score, _, _)| *score > 0);
        // Stable: equal scores keep catalog order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);

        debug!(
            tokens = ?tokens,
            considered = haystacks.len(),
            matched = scored.len(),
            lenient,
            "ranked catalog"
        );

        scored
            .into_iter()
            .map(|(score, reasons, hay)| ScoredCandidate {
                template: hay.template.clone(),
                score,
                match_reason: reasons.join("; "),
            })
            .collect()
    }
}
