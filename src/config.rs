//! Configuration: the feed list and optional settings file.
//!
//! Two inputs, both plain files next to the invocation (or wherever the
//! CLI points):
//!
//! - The **feed list** (`satchel_feeds.conf`): a line-oriented text
//!   format. Blocks are separated by blank lines; the first non-blank
//!   line of a block is the section title, subsequent lines are feed (or
//!   page) URLs. Lines starting with `#` are stripped before parsing.
//!   On first run, a commented stub is generated for the user to edit.
//! - The **settings file** (`satchel.toml`): optional TOML tuning knobs.
//!   A missing file yields `Settings::default()`; every key is optional.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML in settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Stub feed list written on first run.
pub const DEFAULT_FEED_LIST: &str = "\
# satchel feed list
#
# Please edit this file so that it contains the section titles and feed
# URLs that you want. Follow the format of the example: section titles
# immediately followed by a list of URLs. The URLs should either be URLs
# of RSS or Atom feeds or URLs of web pages that contain links to a RSS
# or Atom feed. The 'http://' at the beginning of the URL is optional.
# Sections should be separated by exactly one blank line.

General News
nytimes.com
slate.com

Tech News
techcrunch.com
http://arstechnica.com
slashdot.org

Ebooks
teleread.org/blog
";

/// One section of the feed list: a title and its ordered source URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionConfig {
    pub title: String,
    pub urls: Vec<String>,
}

/// Parses the line-oriented feed list format.
///
/// Comment lines are stripped first; remaining content is split into
/// blank-line-separated blocks. Section order and within-section URL
/// order are preserved exactly as written. A title-only block yields a
/// section with no URLs, which still appears (empty) in the output.
pub fn parse_feed_list(text: &str) -> Vec<SectionConfig> {
    let mut sections = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
    {
        let line = line.trim();
        if line.is_empty() {
            flush_block(&mut block, &mut sections);
        } else {
            block.push(line);
        }
    }
    flush_block(&mut block, &mut sections);

    sections
}

fn flush_block(block: &mut Vec<&str>, sections: &mut Vec<SectionConfig>) {
    if let Some((title, urls)) = block.split_first() {
        sections.push(SectionConfig {
            title: (*title).to_owned(),
            urls: urls.iter().map(|url| (*url).to_owned()).collect(),
        });
    }
    block.clear();
}

/// Loads the feed list, generating a stub on first run.
///
/// Returns `Ok(None)` when the file did not exist and a stub was
/// written: the caller should tell the user to edit it and exit rather
/// than fetch the placeholder feeds.
pub fn load_or_init_feed_list(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        fs::write(path, DEFAULT_FEED_LIST)?;
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
}

/// Tuning knobs from `satchel.toml`.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified; missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-fetch timeout in seconds
    pub timeout_secs: u64,
    /// Maximum concurrent fetches within a section
    pub concurrency: usize,
    /// Directory the generated document is written to
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            concurrency: 6,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Loads settings from `path`; a missing file yields defaults.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}
