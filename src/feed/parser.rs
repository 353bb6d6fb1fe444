use chrono::{DateTime, Utc};
use feed_rs::model::FeedType;
use feed_rs::parser;
use thiserror::Error;

/// Feed dialect, selected by content inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Atom,
}

/// A parsed feed before entry text has been cleaned.
#[derive(Debug)]
pub struct RawFeed {
    pub kind: FeedKind,
    pub entries: Vec<RawEntry>,
}

/// One feed item with its text fields still carrying entities, arbitrary
/// encodings, and unsanitized markup.
#[derive(Debug)]
pub struct RawEntry {
    pub title: String,
    pub content: String,
    pub description: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unparseable feed document: {0}")]
    Syntax(#[from] parser::ParseFeedError),
    #[error("unsupported feed dialect")]
    UnsupportedDialect,
}

/// Parses raw content as an RSS or Atom document, auto-detected.
///
/// Anything `feed-rs` cannot recognize as a feed is a [`ParseError`],
/// which is the trigger for the orchestrator's autodiscovery fallback.
pub fn parse_feed(raw: &str) -> Result<RawFeed, ParseError> {
    let feed = parser::parse(raw.as_bytes())?;

    let kind = match feed.feed_type {
        FeedType::Atom => FeedKind::Atom,
        FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2 => FeedKind::Rss,
        // JSON Feed is out of scope; the digest carries XML dialects only
        FeedType::JSON => return Err(ParseError::UnsupportedDialect),
    };

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone());
            let published = entry.published.or(entry.updated);
            RawEntry {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                content: entry.content.and_then(|c| c.body).unwrap_or_default(),
                description: entry.summary.map(|s| s.content).unwrap_or_default(),
                link,
                published,
            }
        })
        .collect();

    Ok(RawFeed { kind, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <item>
      <guid>1</guid>
      <title>First Post</title>
      <link>http://example.com/post/1</link>
      <description>Short summary</description>
      <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Blog</title>
  <entry>
    <id>1</id>
    <title>First Post</title>
    <link href="http://example.com/post/1"/>
    <summary>Short summary</summary>
    <content type="html">&lt;p&gt;Body&lt;/p&gt;</content>
    <updated>2024-01-01T12:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn detects_rss_dialect() {
        let feed = parse_feed(RSS).unwrap();
        assert_eq!(feed.kind, FeedKind::Rss);
        assert_eq!(feed.entries.len(), 1);
        let entry = &feed.entries[0];
        assert_eq!(entry.title, "First Post");
        assert_eq!(entry.link.as_deref(), Some("http://example.com/post/1"));
        assert_eq!(entry.description, "Short summary");
        assert!(entry.published.is_some());
    }

    #[test]
    fn detects_atom_dialect() {
        let feed = parse_feed(ATOM).unwrap();
        assert_eq!(feed.kind, FeedKind::Atom);
        let entry = &feed.entries[0];
        assert_eq!(entry.content, "<p>Body</p>");
        // Atom has no <published> here; <updated> stands in
        assert!(entry.published.is_some());
    }

    #[test]
    fn html_page_is_not_a_feed() {
        let result = parse_feed("<html><body>Just a page</body></html>");
        assert!(matches!(result, Err(ParseError::Syntax(_))));
    }

    #[test]
    fn json_feed_dialect_is_rejected() {
        let json = r#"{"version":"https://jsonfeed.org/version/1.1","title":"x","items":[]}"#;
        let result = parse_feed(json);
        assert!(matches!(
            result,
            Err(ParseError::UnsupportedDialect) | Err(ParseError::Syntax(_))
        ));
    }

    #[test]
    fn missing_fields_become_empty_strings() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
  <item><guid>1</guid></item>
</channel></rss>"#;
        let feed = parse_feed(rss).unwrap();
        let entry = &feed.entries[0];
        assert_eq!(entry.title, "");
        assert_eq!(entry.content, "");
        assert_eq!(entry.description, "");
        assert_eq!(entry.link, None);
    }
}
