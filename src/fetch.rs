use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::models::ReviewsResponse;

/// Source of review pages. `Ok(None)` means the endpoint had nothing to give
/// (non-200 status, empty body or `{}`); callers treat it as end-of-data.
#[async_trait]
pub trait ReviewFetcher {
    async fn fetch_page(&self, url: &str) -> Result<Option<ReviewsResponse>>;
}

#[async_trait]
impl<T: ReviewFetcher + Sync + ?Sized> ReviewFetcher for &T {
    async fn fetch_page(&self, url: &str) -> Result<Option<ReviewsResponse>> {
        (**self).fetch_page(url).await
    }
}

/// Blocking-per-call HTTP fetcher backed by a shared `reqwest` client.
pub struct HttpReviewFetcher {
    client: Client,
}

impl HttpReviewFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReviewFetcher for HttpReviewFetcher {
    async fn fetch_page(&self, url: &str) -> Result<Option<ReviewsResponse>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if status != StatusCode::OK {
            debug!(%status, url, "non-200 review response");
            return Ok(None);
        }
        let body = resp.bytes().await.with_context(|| format!("read body of {url}"))?;
        parse_page(&body)
    }
}

/// Decode a response body, mapping an empty body or empty object to `None`.
pub fn parse_page(body: &[u8]) -> Result<Option<ReviewsResponse>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body).context("review response is not JSON")?;
    if value.as_object().map_or(true, |o| o.is_empty()) {
        return Ok(None);
    }
    let page = serde_json::from_value(value).context("unexpected review response shape")?;
    Ok(Some(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bodies_are_end_of_data() {
        assert!(parse_page(b"").unwrap().is_none());
        assert!(parse_page(b"  \n").unwrap().is_none());
        assert!(parse_page(b"{}").unwrap().is_none());
        assert!(parse_page(b"null").unwrap().is_none());
    }

    #[test]
    fn page_without_reviews_keeps_cursor() {
        let page = parse_page(br#"{"success":1,"reviews":[],"cursor":"AoJw"}"#)
            .unwrap()
            .unwrap();
        assert!(page.reviews.is_empty());
        assert_eq!(page.cursor.as_deref(), Some("AoJw"));
    }

    #[test]
    fn bad_review_entry_does_not_fail_the_page() {
        let body = br#"{"success":1,"reviews":[{"author":7},{"recommendationid":"1","author":{"steamid":"5"}}],"cursor":"B"}"#;
        let page = parse_page(body).unwrap().unwrap();
        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.cursor.as_deref(), Some("B"));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_page(b"<html>").is_err());
    }
}
