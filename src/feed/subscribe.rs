use futures::stream::{self, StreamExt};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::SectionConfig;
use crate::feed::discovery::discover;
use crate::feed::fetcher::{ensure_scheme, fetch, FetchError};
use crate::feed::normalize::{normalize, NormalizeError, NormalizedFeed};

/// A named group of feed sources, carried through to the rendered output.
///
/// `feeds` holds the successfully normalized feeds in source-URL order;
/// failed URLs shrink the sequence but never reorder it. A section whose
/// every URL failed still appears, empty.
#[derive(Debug)]
pub struct Section {
    pub title: String,
    pub source_urls: Vec<String>,
    pub feeds: Vec<NormalizedFeed>,
}

/// Tuning knobs for the fetch pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SubscribeOptions {
    /// Per-fetch timeout; no network wait is ever unbounded
    pub timeout: Duration,
    /// Bounded worker pool width for URLs within a section
    pub concurrency: usize,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            concurrency: 6,
        }
    }
}

/// Caller-visible classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailureKind {
    Timeout,
    Connection,
    Other,
}

impl From<&FetchError> for FetchFailureKind {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::Timeout => FetchFailureKind::Timeout,
            FetchError::Connect(_) => FetchFailureKind::Connection,
            FetchError::Other(_) => FetchFailureKind::Other,
        }
    }
}

impl fmt::Display for FetchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailureKind::Timeout => write!(f, "timeout"),
            FetchFailureKind::Connection => write!(f, "connection"),
            FetchFailureKind::Other => write!(f, "other"),
        }
    }
}

/// Per-URL status token, one emission per pipeline step.
///
/// The core emits these over the event channel and is agnostic to their
/// presentation; the binary renders them however it likes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlStatus {
    Fetched,
    FetchFailed(FetchFailureKind),
    ParseFailed,
    Discovered { feed_url: String },
    DiscoveryFailed,
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlStatus::Fetched => write!(f, "fetched"),
            UrlStatus::FetchFailed(kind) => write!(f, "fetch-failed:{}", kind),
            UrlStatus::ParseFailed => write!(f, "parse-failed"),
            UrlStatus::Discovered { feed_url } => write!(f, "discovered:{}", feed_url),
            UrlStatus::DiscoveryFailed => write!(f, "discovery-failed"),
        }
    }
}

/// A status token tagged with the configured URL it belongs to.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub url: String,
    pub status: UrlStatus,
}

/// States of the per-URL subscription machine.
///
/// No state is revisited: `Discover` runs at most once per URL, which
/// bounds the fallback depth at one and prevents feed/page cycles.
enum SubscribeState {
    /// Fetch the configured URL as a feed
    Start,
    /// Attempt normalization of the fetched body
    Parse { body: String },
    /// Re-fetch the URL as a page and look for an advertised feed
    Discover,
    /// Fetch the discovered candidate feed URL
    Fallback { feed_url: String },
    /// Attempt normalization of the candidate's body
    ParseFallback { body: String, feed_url: String },
    Done(NormalizedFeed),
    Failed,
}

/// Resolves one configured URL into a normalized feed, if possible.
///
/// Drives fetch → normalize, falling back to fetch → discover → fetch →
/// normalize when the URL turns out to be an ordinary page rather than a
/// feed document. Exactly one fallback attempt is made per URL. Every
/// failure is local: the return value is simply `None` and a status
/// token describing the terminal condition has been emitted.
pub async fn subscribe(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    events: &mpsc::Sender<StatusEvent>,
) -> Option<NormalizedFeed> {
    // Bare hostnames are repaired for the request only; status events
    // keep reporting the URL exactly as configured.
    let request_url = ensure_scheme(url);
    let mut state = SubscribeState::Start;

    loop {
        state = match state {
            SubscribeState::Start => match fetch(client, &request_url, timeout).await {
                Ok(body) => {
                    emit(events, url, UrlStatus::Fetched).await;
                    SubscribeState::Parse { body }
                }
                Err(err) => {
                    emit(events, url, UrlStatus::FetchFailed((&err).into())).await;
                    SubscribeState::Failed
                }
            },

            SubscribeState::Parse { body } => match normalize(&body, url) {
                Ok(feed) => SubscribeState::Done(feed),
                Err(err) => {
                    tracing::debug!(url, error = %err, "feed attempt failed, trying autodiscovery");
                    emit(events, url, UrlStatus::ParseFailed).await;
                    SubscribeState::Discover
                }
            },

            SubscribeState::Discover => match fetch(client, &request_url, timeout).await {
                Ok(page) => match discover(&page, &request_url) {
                    Some(feed_url) => {
                        emit(
                            events,
                            url,
                            UrlStatus::Discovered {
                                feed_url: feed_url.clone(),
                            },
                        )
                        .await;
                        SubscribeState::Fallback { feed_url }
                    }
                    None => {
                        emit(events, url, UrlStatus::DiscoveryFailed).await;
                        SubscribeState::Failed
                    }
                },
                Err(err) => {
                    emit(events, url, UrlStatus::FetchFailed((&err).into())).await;
                    SubscribeState::Failed
                }
            },

            SubscribeState::Fallback { feed_url } => {
                match fetch(client, &feed_url, timeout).await {
                    Ok(body) => {
                        emit(events, url, UrlStatus::Fetched).await;
                        SubscribeState::ParseFallback { body, feed_url }
                    }
                    Err(err) => {
                        emit(events, url, UrlStatus::FetchFailed((&err).into())).await;
                        SubscribeState::Failed
                    }
                }
            }

            SubscribeState::ParseFallback { body, feed_url } => {
                match normalize(&body, &feed_url) {
                    Ok(feed) => SubscribeState::Done(feed),
                    // A zero-entry parse on the fallback attempt is accepted
                    // as-is instead of triggering another discovery round.
                    Err(NormalizeError::Empty { kind }) => {
                        SubscribeState::Done(NormalizedFeed::empty(&feed_url, kind))
                    }
                    Err(NormalizeError::Parse(_)) => {
                        emit(events, url, UrlStatus::ParseFailed).await;
                        SubscribeState::Failed
                    }
                }
            }

            SubscribeState::Done(feed) => return Some(feed),
            SubscribeState::Failed => return None,
        };
    }
}

/// Builds one section by subscribing to each of its URLs.
///
/// Fetches run under a bounded worker pool, but the assembled `feeds`
/// sequence reflects source-URL input order, never completion order:
/// results are buffered and reassembled by original index.
pub async fn build_section(
    client: &reqwest::Client,
    title: &str,
    urls: &[String],
    opts: &SubscribeOptions,
    events: &mpsc::Sender<StatusEvent>,
) -> Section {
    let results: Vec<(usize, Option<NormalizedFeed>)> = stream::iter(urls.iter().enumerate())
        .map(|(index, url)| async move {
            (index, subscribe(client, url, opts.timeout, events).await)
        })
        .buffer_unordered(opts.concurrency.max(1))
        .collect()
        .await;

    let mut slots: Vec<Option<NormalizedFeed>> = Vec::with_capacity(urls.len());
    slots.resize_with(urls.len(), || None);
    for (index, feed) in results {
        slots[index] = feed;
    }

    Section {
        title: title.to_owned(),
        source_urls: urls.to_vec(),
        feeds: slots.into_iter().flatten().collect(),
    }
}

/// Builds every configured section, in configuration order.
pub async fn build_sections(
    client: &reqwest::Client,
    sections: &[SectionConfig],
    opts: &SubscribeOptions,
    events: &mpsc::Sender<StatusEvent>,
) -> Vec<Section> {
    let mut built = Vec::with_capacity(sections.len());
    for section in sections {
        tracing::info!(title = %section.title, urls = section.urls.len(), "building section");
        built.push(build_section(client, &section.title, &section.urls, opts, events).await);
    }
    built
}

async fn emit(events: &mpsc::Sender<StatusEvent>, url: &str, status: UrlStatus) {
    let event = StatusEvent {
        url: url.to_owned(),
        status,
    };
    if events.send(event).await.is_err() {
        tracing::debug!(url, "status receiver dropped");
    }
}
