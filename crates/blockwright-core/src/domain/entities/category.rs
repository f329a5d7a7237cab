//! Section categories and the vocabulary that maps onto them.
//!
//! A category is never declared by template authors; it is inferred from the
//! identifier with a fixed, ordered substring table. The same enum carries a
//! synonym list that the ranker uses to connect query words ("landing",
//! "reviews") to categories ("hero", "testimonial").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Functional family of a page section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hero,
    Header,
    Footer,
    Testimonial,
    Features,
    Pricing,
    Gallery,
    Product,
    Faq,
    Contact,
    Newsletter,
    Cta,
    Team,
    Blog,
    Custom,
}

/// Ordered identifier-substring lookup. First hit wins, so more specific or
/// more important markers come first (`hero-header` is a hero, not a header).
const INFERENCE_TABLE: &[(&str, Category)] = &[
    ("testimonial", Category::Testimonial),
    ("review", Category::Testimonial),
    ("hero", Category::Hero),
    ("banner", Category::Hero),
    ("slideshow", Category::Hero),
    ("header", Category::Header),
    ("navbar", Category::Header),
    ("navigation", Category::Header),
    ("menu", Category::Header),
    ("footer", Category::Footer),
    ("pricing", Category::Pricing),
    ("price", Category::Pricing),
    ("feature", Category::Features),
    ("benefit", Category::Features),
    ("gallery", Category::Gallery),
    ("portfolio", Category::Gallery),
    ("product", Category::Product),
    ("collection", Category::Product),
    ("shop", Category::Product),
    ("faq", Category::Faq),
    ("accordion", Category::Faq),
    ("contact", Category::Contact),
    ("newsletter", Category::Newsletter),
    ("subscribe", Category::Newsletter),
    ("signup", Category::Newsletter),
    ("cta", Category::Cta),
    ("call-to-action", Category::Cta),
    ("team", Category::Team),
    ("staff", Category::Team),
    ("blog", Category::Blog),
    ("article", Category::Blog),
];

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Hero,
        Category::Header,
        Category::Footer,
        Category::Testimonial,
        Category::Features,
        Category::Pricing,
        Category::Gallery,
        Category::Product,
        Category::Faq,
        Category::Contact,
        Category::Newsletter,
        Category::Cta,
        Category::Team,
        Category::Blog,
        Category::Custom,
    ];

    /// Infer the category of a cleaned identifier.
    ///
    /// Unmatched identifiers fall into [`Category::Custom`].
    pub fn infer(identifier: &str) -> Self {
        let lower = identifier.to_lowercase();
        INFERENCE_TABLE
            .iter()
            .find(|(marker, _)| lower.contains(marker))
            .map(|(_, category)| *category)
            .unwrap_or(Category::Custom)
    }

    /// Query words that point at this category. Always contains the
    /// category's own name (except for `Custom`, which nothing points at).
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Self::Hero => &[
                "hero", "landing", "header", "intro", "banner", "splash", "headline", "jumbotron",
            ],
            Self::Header => &["header", "navigation", "navbar", "nav", "menu", "logo"],
            Self::Footer => &["footer", "bottom", "copyright", "social"],
            Self::Testimonial => &[
                "testimonial",
                "testimonials",
                "review",
                "reviews",
                "feedback",
                "rating",
                "ratings",
                "quote",
                "quotes",
                "customer",
                "customers",
            ],
            Self::Features => &["feature", "features", "benefit", "benefits", "services", "highlights"],
            Self::Pricing => &["pricing", "price", "prices", "plan", "plans", "tier", "tiers"],
            Self::Gallery => &["gallery", "images", "photos", "portfolio", "showcase"],
            Self::Product => &[
                "product", "products", "shop", "store", "collection", "catalog", "grid", "cart",
            ],
            Self::Faq => &["faq", "faqs", "question", "questions", "accordion", "help"],
            Self::Contact => &["contact", "form", "address", "map", "location"],
            Self::Newsletter => &["newsletter", "subscribe", "signup", "email", "mailing"],
            Self::Cta => &["cta", "call", "action", "button", "conversion"],
            Self::Team => &["team", "staff", "members", "people", "about"],
            Self::Blog => &["blog", "article", "articles", "posts", "news"],
            Self::Custom => &[],
        }
    }

    /// `true` if the query token is a synonym of this category.
    pub fn is_synonym(self, token: &str) -> bool {
        self.synonyms().contains(&token)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Testimonial => "testimonial",
            Self::Features => "features",
            Self::Pricing => "pricing",
            Self::Gallery => "gallery",
            Self::Product => "product",
            Self::Faq => "faq",
            Self::Contact => "contact",
            Self::Newsletter => "newsletter",
            Self::Cta => "cta",
            Self::Team => "team",
            Self::Blog => "blog",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| DomainError::InvalidTemplate(format!("unknown category '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_from_identifier_substrings() {
        assert_eq!(Category::infer("testimonials-slider"), Category::Testimonial);
        assert_eq!(Category::infer("hero-banner-1"), Category::Hero);
        assert_eq!(Category::infer("promo-banner"), Category::Hero);
        assert_eq!(Category::infer("product-grid-1"), Category::Product);
        assert_eq!(Category::infer("mystery-box"), Category::Custom);
    }

    #[test]
    fn hero_wins_over_header_by_table_order() {
        assert_eq!(Category::infer("hero-header"), Category::Hero);
        assert_eq!(Category::infer("sticky-header"), Category::Header);
    }

    #[test]
    fn hero_synonyms_cover_landing_vocabulary() {
        for word in ["landing", "header", "intro", "banner"] {
            assert!(Category::Hero.is_synonym(word), "{word}");
        }
        assert!(!Category::Hero.is_synonym("footer"));
    }

    #[test]
    fn testimonial_synonyms_cover_review_vocabulary() {
        for word in ["review", "feedback", "rating", "quote", "customer"] {
            assert!(Category::Testimonial.is_synonym(word), "{word}");
        }
    }

    #[test]
    fn every_named_category_lists_itself() {
        for category in Category::ALL {
            if category != Category::Custom {
                assert!(category.is_synonym(category.as_str()), "{category}");
            }
        }
    }

    #[test]
    fn parses_display_form() {
        assert_eq!("Hero".parse::<Category>().unwrap(), Category::Hero);
        assert!("nonsense".parse::<Category>().is_err());
    }
}
