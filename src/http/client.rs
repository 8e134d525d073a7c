//! HTTP client for single-shot JSON POSTs.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, Proxy, StatusCode, header::CONTENT_TYPE};
use serde::Serialize;
use std::time::{Duration, Instant};

use super::tls::configure_trust;
use crate::config::ClientOptions;
use crate::runtime::Runtime;

pub const USER_AGENT: &str = "unity-client";

/// Builds the reqwest client for `options`.
///
/// Both the request timeout and the connect timeout use the configured
/// value. Redirects and everything else keep reqwest's defaults.
#[tracing::instrument(skip(runtime, options))]
pub fn build_client<R: Runtime + ?Sized>(runtime: &R, options: &ClientOptions) -> Result<Client> {
    let timeout = options.timeout();

    let builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout);

    let mut builder = configure_trust(builder, runtime, options)?;

    if let Some(proxy) = options.proxy() {
        debug!("Using proxy {}", proxy);
        let proxy = Proxy::all(proxy).with_context(|| format!("Invalid proxy URL '{}'", proxy))?;
        builder = builder.proxy(proxy);
    }

    builder.build().context("Failed to build HTTP client")
}

/// A raw answer to a POST: the vendor reports failures in the body, so the
/// status is kept for logging only.
#[derive(Debug, Clone, PartialEq)]
pub struct PostResponse {
    pub status: StatusCode,
    pub body: String,
    pub elapsed: Duration,
}

/// HTTP client issuing one request per call, without retries.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// POSTs `body` as JSON and returns the response text.
    #[tracing::instrument(skip(self, body))]
    pub async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<PostResponse> {
        debug!("POST JSON to {}...", url);

        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .context("Failed to send request to Unity")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body from Unity")?;
        let elapsed = started.elapsed();

        debug!(
            "POST {} returned {} ({} bytes) in {:?}",
            url,
            status,
            body.len(),
            elapsed
        );

        Ok(PostResponse {
            status,
            body,
            elapsed,
        })
    }
}
