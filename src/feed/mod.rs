//! The feed resolution, fetching, and normalization pipeline.
//!
//! Given an arbitrary configured URL, which may point at a feed document
//! or at an ordinary web page, this module produces a parsed, cleaned
//! set of entries, with graceful fallback when the URL needs page
//! inspection to locate the real feed:
//!
//! - [`fetcher`] - bounded-timeout HTTP retrieval with failure classification
//! - [`parser`] - RSS/Atom parsing via `feed-rs`, dialect auto-detected
//! - [`normalize`] - entity decoding, Latin-1 transliteration, sanitization
//! - [`sanitize`] - markup cleanup for the constrained reading device
//! - [`discovery`] - feed autodiscovery from a page's `<link>` metadata
//! - [`subscribe`] - the per-URL state machine and section assembly
//!
//! # Example
//!
//! ```ignore
//! use satchel::feed::{build_sections, SubscribeOptions};
//!
//! let sections = build_sections(&client, &config, &opts, &events).await;
//! ```

pub mod discovery;
pub mod fetcher;
pub mod normalize;
pub mod parser;
pub mod sanitize;
pub mod subscribe;

pub use discovery::discover;
pub use fetcher::{ensure_scheme, fetch, FetchError};
pub use normalize::{normalize, Entry, NormalizeError, NormalizedFeed};
pub use parser::FeedKind;
pub use sanitize::sanitize_fragment;
pub use subscribe::{
    build_section, build_sections, subscribe, FetchFailureKind, Section, StatusEvent,
    SubscribeOptions, UrlStatus,
};
