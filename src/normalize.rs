//! HTML-to-text reduction for deviation descriptions.

use scraper::Html;

/// Reduces an HTML fragment to its inner text.
///
/// Tags are discarded; entities are decoded by the parser. Whitespace
/// inside text nodes is preserved as-is, so the writer's field
/// sanitization still applies downstream.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}
