//! Renders the assembled sections into one self-contained HTML document.
//!
//! The document is plain: a table of contents, then every section with
//! its feeds and their sanitized entries. Entry bodies were sanitized
//! during normalization and are inserted verbatim; they are the only
//! markup in the document not produced here.

use chrono::NaiveDate;

use crate::feed::{NormalizedFeed, Section};

/// Output filename for a given run date, e.g. `Satchel Feeds 08-06-2026.html`.
pub fn output_filename(date: NaiveDate) -> String {
    format!("Satchel Feeds {}.html", date.format("%m-%d-%Y"))
}

/// Renders the complete digest document.
///
/// Section order and within-section feed order are taken from the input
/// as-is; the renderer adds no ordering of its own.
pub fn render_document(sections: &[Section], date: NaiveDate) -> String {
    let title = format!("Satchel Feeds {}", date.format("%m-%d-%Y"));
    let mut out = String::new();

    out.push_str("<html>\n<head>\n");
    out.push_str(
        "<meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">\n",
    );
    out.push_str(&format!(
        "<title>{}</title>\n</head>\n<body>\n",
        html_escape::encode_text(&title)
    ));
    out.push_str(&format!("<h1>{}</h1>\n", html_escape::encode_text(&title)));

    // Table of contents
    out.push_str("<ul>\n");
    for (index, section) in sections.iter().enumerate() {
        out.push_str(&format!(
            "<li><a href=\"#section-{}\">{}</a> ({} feeds)</li>\n",
            index,
            html_escape::encode_text(&section.title),
            section.feeds.len()
        ));
    }
    out.push_str("</ul>\n<hr>\n");

    for (index, section) in sections.iter().enumerate() {
        out.push_str(&format!(
            "<h2 id=\"section-{}\">{}</h2>\n",
            index,
            html_escape::encode_text(&section.title)
        ));
        for feed in &section.feeds {
            render_feed(feed, &mut out);
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_feed(feed: &NormalizedFeed, out: &mut String) {
    out.push_str(&format!(
        "<h3>{}</h3>\n",
        html_escape::encode_text(&feed.source_url)
    ));

    for entry in &feed.entries {
        match &entry.link {
            Some(link) => out.push_str(&format!(
                "<h4><a href=\"{}\">{}</a></h4>\n",
                html_escape::encode_double_quoted_attribute(link),
                html_escape::encode_text(&entry.title)
            )),
            None => out.push_str(&format!(
                "<h4>{}</h4>\n",
                html_escape::encode_text(&entry.title)
            )),
        }

        if let Some(published) = entry.published {
            out.push_str(&format!(
                "<p><em>{}</em></p>\n",
                published.format("%a, %d %b %Y %H:%M")
            ));
        }

        // Prefer the full content; fall back to the short description
        let body = if entry.content.trim().is_empty() {
            &entry.description
        } else {
            &entry.content
        };
        out.push_str(body);
        out.push_str("\n<hr>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Entry, FeedKind};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn sample_section() -> Section {
        Section {
            title: "Tech & News".to_owned(),
            source_urls: vec!["example.com".to_owned()],
            feeds: vec![NormalizedFeed {
                source_url: "example.com".to_owned(),
                kind: FeedKind::Rss,
                entries: vec![Entry {
                    title: "A <Post>".to_owned(),
                    content: "<p>body</p>".to_owned(),
                    description: "short".to_owned(),
                    link: Some("http://example.com/post/1".to_owned()),
                    published: None,
                }],
            }],
        }
    }

    #[test]
    fn filename_carries_run_date() {
        assert_eq!(output_filename(date()), "Satchel Feeds 08-06-2026.html");
    }

    #[test]
    fn document_contains_toc_sections_and_entries() {
        let html = render_document(&[sample_section()], date());
        assert!(html.contains("<a href=\"#section-0\">Tech &amp; News</a>"));
        assert!(html.contains("<h2 id=\"section-0\">Tech &amp; News</h2>"));
        assert!(html.contains("<a href=\"http://example.com/post/1\">A &lt;Post&gt;</a>"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn empty_sections_still_appear() {
        let section = Section {
            title: "Hollow".to_owned(),
            source_urls: vec![],
            feeds: vec![],
        };
        let html = render_document(&[section], date());
        assert!(html.contains("<h2 id=\"section-0\">Hollow</h2>"));
        assert!(html.contains("(0 feeds)"));
    }

    #[test]
    fn description_stands_in_for_missing_content() {
        let mut section = sample_section();
        section.feeds[0].entries[0].content = String::new();
        let html = render_document(&[section], date());
        assert!(html.contains("short"));
    }
}
