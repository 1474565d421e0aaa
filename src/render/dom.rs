//! DOM query helpers over a rendered page
//!
//! These are the query/text/attribute operations adapters use. A query that
//! matches nothing returns an empty vector, never an error.

use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Parses a CSS selector
pub fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::InvalidSelector(format!("{css}: {e:?}")))
}

/// Returns every element in the document matching `selector`
pub fn query_document<'a>(document: &'a Html, selector: &Selector) -> Vec<ElementRef<'a>> {
    document.select(selector).collect()
}

/// Returns every descendant of `scope` matching `selector`
pub fn query<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    scope.select(selector).collect()
}

/// Returns the first descendant of `scope` matching `selector`
pub fn query_first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Visible text of an element with whitespace runs collapsed
pub fn text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Attribute value, or `None` when absent
pub fn attribute(element: ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(|v| v.trim().to_string())
}

/// Resolves a link href against the site's origin
///
/// Absolute http(s) links pass through unchanged; site-relative paths are
/// joined onto `base`. Script, mail, phone and data links, fragment-only
/// links and anything that does not resolve to http(s) are rejected.
pub fn resolve_url(base: &Url, href: &str) -> Result<Url, ExtractionError> {
    let href = href.trim();
    let reject = |reason: &str| ExtractionError::UnresolvableUrl {
        href: href.to_string(),
        reason: reason.to_string(),
    };

    if href.is_empty() {
        return Err(reject("empty href"));
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return Err(reject("unsupported scheme"));
    }

    if href.starts_with('#') {
        return Err(reject("fragment-only link"));
    }

    let absolute = base.join(href).map_err(|e| reject(&e.to_string()))?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Ok(absolute)
    } else {
        Err(reject("not an http(s) URL"))
    }
}
