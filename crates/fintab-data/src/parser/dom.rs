//! Minimal DOM queries over `scraper`.

use crate::error::ParseError;
use scraper::{ElementRef, Selector};

/// Compile a CSS selector.
pub(crate) fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::Selector(css.to_string()))
}

/// First descendant of `scope` whose `id` attribute equals `id`.
pub(crate) fn find_by_id<'a>(
    scope: ElementRef<'a>,
    id: &str,
) -> Result<Option<ElementRef<'a>>, ParseError> {
    // attribute form, so ids need no CSS escaping
    let by_id = selector(&format!("[id=\"{id}\"]"))?;
    Ok(scope.select(&by_id).next())
}

/// All descendants of `scope` matching `tag`, in document order.
pub(crate) fn find_all<'a>(scope: ElementRef<'a>, tag: &Selector) -> Vec<ElementRef<'a>> {
    scope.select(tag).collect()
}

/// Concatenated text content, trimmed.
pub(crate) fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
