//! Client for the Portal course-data endpoint
//!
//! The vendor serves JSONP rather than plain JSON: the payload arrives
//! wrapped in a `lingkCallback(...)` call with a trailing newline.
//! [`decode_envelope`] strips that frame and parses the inner JSON, so
//! envelope mismatches and JSON syntax failures surface as distinct errors.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::{self, CourseCatalog, NormalizerOptions};
use crate::error::{Error, Result};

/// URL that returns JSONP containing course data from the Portal API
const PORTAL_URL: &str = "https://csearch.yancey.io/courses.json";
const USER_AGENT: &str = concat!("coursegraph/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Function-call frame the vendor emits around the JSON payload
const ENVELOPE_PREFIX: &str = "lingkCallback(";
const ENVELOPE_SUFFIX: &str = ")\n";

/// Bodies longer than this are summarized in error messages
const SUMMARY_LIMIT: usize = 16;

/// HTTP client for the Portal endpoint
pub struct PortalClient {
    http_client: reqwest::Client,
    url: String,
}

impl PortalClient {
    /// Create a client pointed at the production endpoint.
    pub fn new() -> Result<Self> {
        Self::with_url(PORTAL_URL)
    }

    /// Create a client pointed at an alternate endpoint.
    pub fn with_url(url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            http_client,
            url: url.to_string(),
        })
    }

    /// Fetch the vendor document and unwrap the JSONP envelope.
    pub async fn fetch_document(&self) -> Result<Value> {
        debug!(url = %self.url, "fetching course data");
        let response = self.http_client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(status));
        }
        let body = response.text().await?;
        decode_envelope(&body)
    }

    /// Fetch and normalize the catalog in one step.
    pub async fn fetch_catalog(&self, options: NormalizerOptions) -> Result<CourseCatalog> {
        let document = self.fetch_document().await?;
        let catalog = catalog::normalize_with(&document, options)?;
        info!(
            courses = catalog.courses.len(),
            sections = catalog.sections.len(),
            "course data fetched and normalized"
        );
        Ok(catalog)
    }
}

/// Unwrap the `lingkCallback(<json>)\n` envelope and parse the payload.
///
/// A body that does not match the frame exactly is rejected with a
/// truncated prefix+suffix summary for diagnostics; a body that matches
/// but holds invalid JSON is a parse error.
pub fn decode_envelope(body: &str) -> Result<Value> {
    let inner = body
        .strip_prefix(ENVELOPE_PREFIX)
        .and_then(|rest| rest.strip_suffix(ENVELOPE_SUFFIX))
        .ok_or_else(|| Error::MalformedResponse(summarize_body(body)))?;
    serde_json::from_str(inner).map_err(|e| Error::Parse(e.to_string()))
}

/// First 14 + last 2 characters of an unexpected body, or the whole body
/// verbatim when it is short enough to quote outright.
fn summarize_body(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    if chars.len() > SUMMARY_LIMIT {
        let head: String = chars[..ENVELOPE_PREFIX.len()].iter().collect();
        let tail: String = chars[chars.len() - ENVELOPE_SUFFIX.len()..].iter().collect();
        format!("\"{head}...{tail}\"")
    } else {
        format!("\"{body}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PortalClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_decode_envelope_valid() {
        let value = decode_envelope("lingkCallback({\"data\":[]})\n").unwrap();
        assert_eq!(value["data"], serde_json::json!([]));
    }

    #[test]
    fn test_decode_envelope_short_body_quoted_verbatim() {
        let err = decode_envelope("garbage").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("garbage"), "unexpected message: {message}");
    }

    #[test]
    fn test_decode_envelope_long_body_summarized() {
        let body = "<html><body>not the feed you wanted</body></html>";
        let err = decode_envelope(body).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"<html><body>no...l>\""));
        assert!(!message.contains("feed you wanted"));
    }

    #[test]
    fn test_decode_envelope_missing_trailing_newline() {
        let err = decode_envelope("lingkCallback({\"data\":[]})").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_decode_envelope_invalid_inner_json() {
        let err = decode_envelope("lingkCallback({\"data\":)\n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
