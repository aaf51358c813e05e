//! Outbound link discovery for a single page.
//!
//! Extraction itself never fails: markup the parser cannot make sense of
//! just yields fewer hrefs.

use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static HREF_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[href]").expect("static selector parses"));

/// Fragments that mark an href as a non-page resource (stylesheets, data,
/// icons, images, scripts, licence badges).
const RESOURCE_DENYLIST: [&str; 8] = [
    "css",
    "json",
    ".ico",
    ".svg",
    ".js",
    "creativecommons",
    "png",
    "jpg",
];

const REJECTED_SCHEMES: [&str; 2] = ["mailto:", "javascript:"];

/// Raw href values in document order, trimmed, empties dropped.
///
/// Every element carrying an `href` attribute counts, not only anchors.
/// Attribute names are matched case-insensitively by the HTML parser.
pub fn extract(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);

    document
        .select(&HREF_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when the raw href is a mail/script pseudo-link or looks like a
/// static resource rather than a page. Matching is case-sensitive; other
/// spellings of the pseudo-protocols fail the http(s) check in [`accept`].
pub fn is_rejected(href: &str) -> bool {
    REJECTED_SCHEMES
        .iter()
        .any(|scheme| href.starts_with(scheme))
        || RESOURCE_DENYLIST
            .iter()
            .any(|fragment| href.contains(fragment))
}

/// Resolves `href` against the page it was found on and strips the fragment.
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

/// Applies the full candidate policy to one raw href, returning the page
/// identifier it points at if it is acceptable as an edge target.
pub fn accept(base: &Url, href: &str) -> Option<String> {
    if is_rejected(href) {
        debug!("  -> rejected resource link {}", href);
        return None;
    }

    let resolved = resolve(base, href)?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        other => {
            debug!("  -> rejected {} link {}", other, resolved);
            None
        }
    }
}

/// Candidate edge targets for a page, in document order.
pub fn extract_links(markup: &str, base: &Url) -> Vec<String> {
    extract(markup)
        .iter()
        .filter_map(|href| accept(base, href))
        .collect()
}

/// Normalises a user-supplied start URL into a page identifier.
pub fn normalize_page_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    url.set_fragment(None);
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}
