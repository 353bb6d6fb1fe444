use scraper::{Html, Selector};
use url::Url;

/// Feed MIME types recognized during autodiscovery, in preference order.
///
/// Atom is preferred over RSS, and a generic XML link is accepted as a
/// last resort. Pages that advertise several feeds get the highest-ranked
/// one, matching the order a feed-capable browser would offer them.
const FEED_TYPES: [&str; 3] = [
    "application/atom+xml",
    "application/rss+xml",
    "text/xml",
];

/// Locates a feed URL advertised in a page's discovery metadata.
///
/// Scans the page's `<link>` elements for one whose declared `type`
/// matches an Atom feed, then an RSS feed, then generic XML, e.g.
///
/// ```html
/// <link rel="alternate" type="application/rss+xml" title="RSS"
///       href="http://feeds.feedburner.com/TheRssBlog">
/// ```
///
/// The matched `href` is resolved against `page_url`, so relative and
/// protocol-relative targets come back absolute. Type attributes are
/// matched case-insensitively since real-world markup is inconsistently
/// cased. Pure parse of already-fetched content; no network access, and
/// a malformed page simply yields `None`.
pub fn discover(page_markup: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(page_markup);
    let links = Selector::parse("link[type][href]").ok()?;

    for wanted in FEED_TYPES {
        for link in document.select(&links) {
            let declared = match link.value().attr("type") {
                Some(declared) => declared.trim(),
                None => continue,
            };
            if !declared.eq_ignore_ascii_case(wanted) {
                continue;
            }
            if let Some(href) = link.value().attr("href") {
                return resolve_href(href, page_url);
            }
        }
    }

    None
}

/// Resolves a discovered `href` against the page it was found on.
///
/// Returns `None` when the base URL itself is unparseable, since a feed
/// URL we cannot absolutize is not fetchable either.
fn resolve_href(href: &str, page_url: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let resolved = base.join(href.trim()).ok()?;
    Some(resolved.into())
}
