//! Identifier and naming helpers shared by the loader, ranker and splitter.
//!
//! Every catalog identifier and every generated artifact identifier goes
//! through [`slugify`], so both sides of a lookup agree on one canonical
//! shape: lowercase ASCII alphanumerics separated by single hyphens.

/// Prefixes that template authors commonly put in front of file names and
/// that carry no meaning for search.
const NOISE_PREFIXES: &[&str] = &["sections-", "section-", "snippet-", "block-", "template-"];

/// Turn arbitrary text into a slug.
///
/// ## Rules
///
/// 1. Lowercase everything
/// 2. Anything that is not `[a-z0-9]` becomes a separator
/// 3. Runs of separators collapse to one `-`
/// 4. Leading and trailing separators are dropped
///
/// ## Examples
///
/// | Input | Output |
/// |-------|--------|
/// | "Hero Banner" | "hero-banner" |
/// | "  FAQ / Accordion!" | "faq-accordion" |
/// | "product__grid" | "product-grid" |
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Clean a file stem into a catalog identifier.
///
/// Applies [`slugify`] and then strips one leading noise prefix such as
/// `section-`. A stem that would become empty after stripping keeps its
/// prefix.
pub fn clean_identifier(stem: &str) -> String {
    let slug = slugify(stem.trim().trim_start_matches('_'));

    for prefix in NOISE_PREFIXES {
        if let Some(rest) = slug.strip_prefix(prefix) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }

    slug
}

/// Produce a display name from an identifier: `hero-banner-1` → `Hero Banner 1`.
pub fn humanize(identifier: &str) -> String {
    identifier
        .split(['-', '_', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Hero  Banner"), "hero-banner");
        assert_eq!(slugify("  FAQ / Accordion!"), "faq-accordion");
        assert_eq!(slugify("product__grid"), "product-grid");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Menü"), "caf-men");
    }

    #[test]
    fn clean_identifier_strips_noise_prefix() {
        assert_eq!(clean_identifier("section-hero-banner"), "hero-banner");
        assert_eq!(clean_identifier("_Testimonials Slider "), "testimonials-slider");
        assert_eq!(clean_identifier("hero-banner-1"), "hero-banner-1");
    }

    #[test]
    fn clean_identifier_keeps_prefix_when_nothing_remains() {
        assert_eq!(clean_identifier("section-"), "section");
    }

    #[test]
    fn humanize_title_cases_segments() {
        assert_eq!(humanize("hero-banner-1"), "Hero Banner 1");
        assert_eq!(humanize("faq"), "Faq");
        assert_eq!(humanize(""), "");
    }
}
