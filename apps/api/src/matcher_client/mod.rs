//! Matcher Client: the single path from this service to the downstream matcher.
//!
//! One POST per upload, bounded by the configured timeout, never retried.
//! The matcher's reply is handed back to the caller as-is by `relay_response`.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::header::CONTENT_TYPE,
    response::Response,
};
use futures::TryStreamExt;
use reqwest::{multipart::Form, Client, Url};
use thiserror::Error;
use tracing::{debug, error};

pub const MATCHER_PATH: &str = "/matcher";

#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("Matcher request timed out")]
    Timeout,

    #[error("Matcher unreachable: {0}")]
    Unreachable(reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Failed to relay matcher response body: {0}")]
    Relay(reqwest::Error),
}

impl MatcherError {
    fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MatcherError::Timeout
        } else if err.is_connect() {
            MatcherError::Unreachable(err)
        } else {
            MatcherError::Http(err)
        }
    }
}

#[derive(Clone)]
pub struct MatcherClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl MatcherClient {
    /// `base_url` is the matcher's root address; `/matcher` is appended.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), MATCHER_PATH);
        let endpoint = Url::parse(&raw).with_context(|| format!("Invalid matcher URL '{raw}'"))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts the re-encoded upload. `Content-Type` (with the form's own
    /// boundary) is set by reqwest from `form`.
    ///
    /// Any HTTP status from the matcher counts as success here; only transport
    /// failures are errors.
    pub async fn submit(&self, form: Form) -> Result<reqwest::Response, MatcherError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(MatcherError::from_send)?;

        debug!(status = %response.status(), "Matcher responded");
        Ok(response)
    }
}

/// Copies status, `Content-Type` and body of the matcher's response into an
/// outgoing response.
///
/// The body is streamed. A read failure part-way through ends the stream with
/// an error, which aborts the connection to the client; the status line has
/// already been sent at that point. The matcher connection is released when the
/// stream finishes or is dropped, including on client disconnect.
pub fn relay_response(response: reqwest::Response) -> Response {
    let status = response.status();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();

    let stream = response.bytes_stream().map_err(|e| {
        let err = MatcherError::Relay(e);
        error!("{err}");
        err
    });

    let mut relayed = Response::new(Body::from_stream(stream));
    *relayed.status_mut() = status;
    if let Some(content_type) = content_type {
        relayed.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    relayed
}
