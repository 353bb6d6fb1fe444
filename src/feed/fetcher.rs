use encoding_rs::{Encoding, UTF_8};
use futures::StreamExt;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving a URL.
///
/// Timeouts are classified distinctly from other connection failures so
/// the orchestrator can report a specific diagnostic, but every variant
/// is non-fatal: a failed URL contributes nothing to its section and
/// processing moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded the configured per-fetch timeout
    #[error("request timed out")]
    Timeout,
    /// Connection-level failure (DNS, refused connection, TLS)
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other failure: non-2xx status, oversized or truncated body
    #[error("request failed: {0}")]
    Other(String),
}

/// Prefixes `http://` when a URL carries no scheme.
///
/// Feed lists routinely contain bare hostnames like `example.com/blog`.
/// The prefix is applied to the URL actually requested, never to the one
/// displayed or reported.
pub fn ensure_scheme(url: &str) -> Cow<'_, str> {
    if url.contains("://") {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!("http://{}", url))
    }
}

/// Retrieves the body of `url` as text, with a bounded timeout.
///
/// Issues exactly one outbound request per call: results are not cached,
/// and there is no network-level retry. The response body is streamed
/// with a 10MB cap and decoded to a `String` honoring the charset
/// declared in `Content-Type`, falling back to lossy UTF-8.
///
/// # Errors
///
/// - [`FetchError::Timeout`] - no response within `timeout`
/// - [`FetchError::Connect`] - DNS, connection, or TLS failure
/// - [`FetchError::Other`] - non-2xx status or unusable body
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let response = tokio::time::timeout(timeout, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(classify)?;

    if !response.status().is_success() {
        return Err(FetchError::Other(format!(
            "HTTP status {}",
            response.status().as_u16()
        )));
    }

    let charset = charset_from_headers(&response);
    let bytes = read_limited_bytes(response).await?;

    Ok(decode_body(&bytes, charset.as_deref()))
}

/// Maps a `reqwest` error onto the three caller-visible failure kinds.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Connect(err.to_string())
    } else {
        FetchError::Other(err.to_string())
    }
}

/// Extracts the charset parameter from the `Content-Type` header, if any.
fn charset_from_headers(response: &reqwest::Response) -> Option<String> {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)?
        .to_str()
        .ok()?;

    content_type
        .split(';')
        .skip(1)
        .find_map(|param| param.trim().strip_prefix("charset="))
        .map(|label| label.trim_matches('"').to_owned())
}

/// Decodes raw body bytes using the labeled encoding, or lossy UTF-8.
///
/// Unknown charset labels fall back to UTF-8; `encoding_rs` substitutes
/// replacement characters for undecodable sequences rather than failing,
/// so this never errors.
fn decode_body(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Reads a response body with a size cap using stream-based reading.
async fn read_limited_bytes(response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > MAX_BODY_SIZE {
            return Err(FetchError::Other("response too large".to_owned()));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(classify)?;
        if bytes.len().saturating_add(chunk.len()) > MAX_BODY_SIZE {
            return Err(FetchError::Other("response too large".to_owned()));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn scheme_is_prefixed_when_absent() {
        assert_eq!(ensure_scheme("example.com/blog"), "http://example.com/blog");
        assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
        assert_eq!(ensure_scheme("https://example.com"), "https://example.com");
    }

    #[test]
    fn charset_decoding_handles_latin1() {
        // "café" in ISO-8859-1: the é is a single 0xE9 byte
        let bytes = b"caf\xe9";
        assert_eq!(decode_body(bytes, Some("iso-8859-1")), "café");
        assert_eq!(decode_body("café".as_bytes(), None), "café");
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode_body(b"plain", Some("x-nonsense")), "plain");
    }

    #[tokio::test]
    async fn fetch_returns_body_on_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<rss/>")
                    .insert_header("Content-Type", "application/xml; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let body = fetch(
            &client,
            &format!("{}/feed", mock_server.uri()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(body, "<rss/>");
    }

    #[tokio::test]
    async fn fetch_classifies_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch(
            &client,
            &format!("{}/feed", mock_server.uri()),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }

    #[tokio::test]
    async fn fetch_classifies_connection_failure() {
        // Nothing listens on this port
        let client = reqwest::Client::new();
        let err = fetch(
            &client,
            "http://127.0.0.1:1/feed",
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FetchError::Connect(_)));
    }

    #[tokio::test]
    async fn fetch_reports_http_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch(
            &client,
            &format!("{}/feed", mock_server.uri()),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        match err {
            FetchError::Other(msg) => assert!(msg.contains("404")),
            other => panic!("expected Other, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_rejects_oversized_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(vec![b'x'; MAX_BODY_SIZE + 1]),
            )
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch(
            &client,
            &format!("{}/feed", mock_server.uri()),
            Duration::from_secs(30),
        )
        .await
        .unwrap_err();
        match err {
            FetchError::Other(msg) => assert!(msg.contains("too large")),
            other => panic!("expected Other, got {:?}", other),
        }
    }
}
