use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::feed::parser::{parse_feed, FeedKind, RawEntry};
use crate::feed::sanitize::sanitize_fragment;
use crate::util::strip_control_chars;

/// A successfully parsed and cleaned feed.
///
/// Immutable after creation. `entries` is non-empty except when the feed
/// was produced by the orchestrator's fallback path, where a zero-entry
/// parse is accepted as-is rather than triggering another discovery round.
#[derive(Debug)]
pub struct NormalizedFeed {
    pub source_url: String,
    pub kind: FeedKind,
    pub entries: Vec<Entry>,
}

impl NormalizedFeed {
    /// An entry-less feed, constructed only on the fallback path.
    pub fn empty(source_url: &str, kind: FeedKind) -> Self {
        Self {
            source_url: source_url.to_owned(),
            kind,
            entries: Vec::new(),
        }
    }
}

/// One cleaned feed item.
///
/// All three text fields are entity-decoded, transliterated to the
/// Latin-1 repertoire, and markup-sanitized before the entry exists.
#[derive(Debug)]
pub struct Entry {
    pub title: String,
    /// Sanitized HTML fragment
    pub content: String,
    /// Sanitized HTML fragment
    pub description: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Unparseable or unrecognized feed document
    #[error("parse error: {0}")]
    Parse(String),
    /// Parsed cleanly but carried no entries
    #[error("feed contains no entries")]
    Empty { kind: FeedKind },
}

/// Parses raw feed content and cleans every entry.
///
/// Steps: parse as RSS/Atom (auto-detected), decode character entities,
/// transliterate to Latin-1 with lossy fallback, and sanitize the
/// `content` and `description` markup independently. A feed with zero
/// entries is reported as [`NormalizeError::Empty`]; the caller decides
/// whether that counts as a failure (first attempt) or an acceptable
/// empty result (fallback attempt).
pub fn normalize(raw: &str, source_url: &str) -> Result<NormalizedFeed, NormalizeError> {
    let feed = parse_feed(raw).map_err(|e| NormalizeError::Parse(e.to_string()))?;

    if feed.entries.is_empty() {
        return Err(NormalizeError::Empty { kind: feed.kind });
    }

    let entries = feed.entries.into_iter().map(clean_entry).collect();

    Ok(NormalizedFeed {
        source_url: source_url.to_owned(),
        kind: feed.kind,
        entries,
    })
}

fn clean_entry(raw: RawEntry) -> Entry {
    Entry {
        title: clean_text(&raw.title),
        content: sanitize_fragment(&clean_text(&raw.content)),
        description: sanitize_fragment(&clean_text(&raw.description)),
        link: raw.link,
        published: raw.published,
    }
}

/// Entity-decodes and transliterates one text field.
///
/// Entities are decoded before the markup pass so that feeds shipping
/// entity-escaped HTML fragments (a very common dialect abuse) sanitize
/// the markup they carry, not its escaped image.
fn clean_text(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    let stripped = strip_control_chars(&decoded);
    to_latin1(&stripped)
}

/// Transliteration strategies, attempted in order.
///
/// `Substitute` rejects any character it cannot approximate;
/// `Strip` drops what it cannot map and therefore always succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transliteration {
    Substitute,
    Strip,
}

const STRATEGIES: [Transliteration; 2] = [Transliteration::Substitute, Transliteration::Strip];

/// A character the current strategy could not map into Latin-1.
#[derive(Debug)]
struct Unmappable(char);

/// Maps text into the Latin-1 repertoire, best-effort first.
///
/// Upstream feeds are frequently mislabeled or mixed-encoding, so a
/// single exotic character must not discard an otherwise-usable entry:
/// when approximation fails the lossy pass drops the offender instead.
/// Never fails.
fn to_latin1(text: &str) -> String {
    for strategy in STRATEGIES {
        match transliterate(text, strategy) {
            Ok(mapped) => return mapped,
            Err(Unmappable(c)) => {
                tracing::debug!(
                    character = %c.escape_unicode(),
                    "transliteration fell back to lossy mode"
                );
            }
        }
    }
    // Strip maps every input to Ok
    String::new()
}

fn transliterate(text: &str, strategy: Transliteration) -> Result<String, Unmappable> {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if (c as u32) <= 0xFF {
            out.push(c);
            continue;
        }
        match approximate(c) {
            Some(substitute) => out.push_str(substitute),
            None => match strategy {
                Transliteration::Substitute => return Err(Unmappable(c)),
                Transliteration::Strip => {}
            },
        }
    }
    Ok(out)
}

/// Latin-1 approximations for characters commonly found in feeds.
///
/// Mirrors the substitutions a transliterating character converter
/// applies for typographic punctuation and a handful of letters.
fn approximate(c: char) -> Option<&'static str> {
    let substitute = match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{2039}'
        | '\u{203A}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => "-",
        '\u{2026}' => "...",
        '\u{2022}' | '\u{2219}' | '\u{2217}' => "*",
        '\u{2044}' => "/",
        '\u{20AC}' => "EUR",
        '\u{2122}' => "(TM)",
        '\u{0152}' => "OE",
        '\u{0153}' => "oe",
        '\u{0160}' => "S",
        '\u{0161}' => "s",
        '\u{017D}' => "Z",
        '\u{017E}' => "z",
        '\u{0178}' => "Y",
        '\u{0192}' => "f",
        '\u{FB01}' => "fi",
        '\u{FB02}' => "fl",
        // Exotic spaces collapse to a plain space
        '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => " ",
        // Zero-width characters and BOM leave no residue
        '\u{200B}'..='\u{200D}' | '\u{FEFF}' => "",
        _ => return None,
    };
    Some(substitute)
}
