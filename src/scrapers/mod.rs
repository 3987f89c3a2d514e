//! Scrapers for NHK みんなでプラス pages.
//!
//! Two page types are scraped:
//!
//! | Page | Module | Produces |
//! |------|--------|----------|
//! | Topic article | [`article`] | [`Article`](crate::models::Article) |
//! | Comment thread | [`comments`] | `Vec<`[`Comment`](crate::models::Comment)`>` |
//!
//! Both work from a parsed [`scraper::Html`] tree, so the extraction logic
//! is tested against HTML fragments without any network. Fetching goes
//! through [`PageFetcher`](crate::fetch::PageFetcher).
//!
//! Text is read the way the site's markup needs it: every text node is
//! trimmed and the pieces are concatenated without separators.

pub mod article;
pub mod comments;

use scraper::{ElementRef, Selector};

/// Text of `element` with each text node trimmed and joined without spaces.
pub(crate) fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Stripped text of the first descendant matching `selector`, if any.
///
/// An element that exists but holds no text yields `Some("")`.
pub(crate) fn select_first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(stripped_text)
}
