//! Minimal built-in catalog.
//!
//! Served by [`FilesystemCatalog`](super::FilesystemCatalog) when its
//! directory cannot be read, so catalog queries always have something to
//! rank. Each entry carries a complete configuration block.

use tracing::warn;

use blockwright_core::domain::{Template, TemplateId};

use super::template_from_source;

const HERO_BANNER: &str = r#"<section class="hero-banner" style="background-image: url({{ background_image }})">
  <div class="hero-banner__content">
    <h1>{{ heading }}</h1>
    <p>{{ subheading }}</p>
    <a class="button" href="{{ button_link }}">{{ button_label }}</a>
  </div>
</section>

{% schema %}
{
  "name": "Hero Banner",
  "description": "Full-width banner with heading, subheading and call to action",
  "tags": ["hero", "banner"],
  "settings": [
    {"id": "heading", "type": "text", "label": "Heading", "default": "Welcome to our store"},
    {"id": "subheading", "type": "text", "label": "Subheading", "default": "Quality you can trust"},
    {"id": "button_label", "type": "text", "label": "Button label", "default": "Shop now"},
    {"id": "button_link", "type": "url", "label": "Button link", "default": "/collections/all"},
    {"id": "background_image", "type": "image_picker", "label": "Background image"}
  ],
  "presets": [{"name": "Hero Banner"}]
}
{% endschema %}
"#;

const PRODUCT_GRID: &str = r#"<section class="product-grid">
  <h2>{{ heading }}</h2>
  <ul class="product-grid__items" data-columns="{{ columns }}">
    {% for product in collections[section.settings.collection].products limit: 8 %}
      <li><a href="{{ product.url }}">{{ product.title }}</a></li>
    {% endfor %}
  </ul>
</section>

{% schema %}
{
  "name": "Product Grid",
  "description": "Grid of products from a collection",
  "tags": ["product", "collection", "grid"],
  "settings": [
    {"id": "heading", "type": "text", "label": "Heading", "default": "Featured products"},
    {"id": "collection", "type": "collection", "label": "Collection"},
    {"id": "columns", "type": "range", "label": "Columns", "default": 4}
  ],
  "presets": [{"name": "Product Grid"}]
}
{% endschema %}
"#;

const TESTIMONIALS: &str = r#"<section class="testimonials">
  <h2>{{ heading }}</h2>
  <blockquote>
    <p>{{ quote }}</p>
    <cite>{{ author }}</cite>
  </blockquote>
</section>

{% schema %}
{
  "name": "Testimonials",
  "description": "Customer quote with attribution",
  "tags": ["testimonial", "review", "social proof"],
  "settings": [
    {"id": "heading", "type": "text", "label": "Heading", "default": "What our customers say"},
    {"id": "quote", "type": "textarea", "label": "Quote", "default": "Fast shipping and great service."},
    {"id": "author", "type": "text", "label": "Author", "default": "A happy customer"}
  ],
  "presets": [{"name": "Testimonials"}]
}
{% endschema %}
"#;

const ENTRIES: &[(&str, &str)] = &[
    ("hero-banner-default", HERO_BANNER),
    ("product-grid-default", PRODUCT_GRID),
    ("testimonials-default", TESTIMONIALS),
];

/// The built-in entries, in fixed order.
pub fn fallback_catalog() -> Vec<Template> {
    ENTRIES
        .iter()
        .filter_map(|(id, source)| {
            let id = TemplateId::parse(id).ok()?;
            template_from_source(id, source, None)
                .inspect_err(|e| warn!(error = %e, "skipping built-in template"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwright_core::domain::Category;

    #[test]
    fn every_builtin_parses_with_its_block() {
        let catalog = fallback_catalog();
        assert_eq!(catalog.len(), ENTRIES.len());
        assert!(catalog.iter().all(|t| !t.is_schema_less()));
    }

    #[test]
    fn builtins_get_categories_from_their_ids() {
        let catalog = fallback_catalog();
        assert_eq!(catalog[0].category, Category::Hero);
        assert_eq!(catalog[1].category, Category::Product);
        assert_eq!(catalog[2].category, Category::Testimonial);
    }

    #[test]
    fn builtin_defaults_are_available_for_assembly() {
        let hero = &fallback_catalog()[0];
        assert_eq!(
            hero.variables["button_label"].default_text().as_deref(),
            Some("Shop now")
        );
    }
}
