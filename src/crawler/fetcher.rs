//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with a descriptive user agent string
//! - The [`Transport`] seam the rest of the crawler talks to
//! - Mapping transport failures and non-2xx statuses onto [`FetchError`]
//! - Routing every request through the shared minimum-interval gate

use crate::config::UserAgentConfig;
use crate::crawler::rate_limit::{Clock, MinIntervalGate};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Raw response from a transport: status code and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Something that can issue a GET request
///
/// Implementations only report transport-level failures (`Timeout`,
/// `TransportFailure`); status handling happens in [`Fetcher`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        (**self).get(url).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `request_timeout` - Whole-request deadline
/// * `connect_timeout` - Connection establishment deadline
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::UserAgentConfig;
/// use catalog_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(
///     &UserAgentConfig::default(),
///     Duration::from_secs(30),
///     Duration::from_secs(10),
/// )
/// .unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    request_timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Transport`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).send().await.map_err(classify_error)?;
        let status = response.status();

        // The body of an error page is never used
        if !status.is_success() {
            return Ok(HttpResponse {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let body = response.text().await.map_err(classify_error)?;
        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Maps a `reqwest` error onto the fetch error taxonomy
fn classify_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::TransportFailure(format!("connection failed: {}", error))
    } else {
        FetchError::TransportFailure(error.to_string())
    }
}

/// Rate-limited page fetcher
///
/// All requests of a run, listing and detail alike, pass through one
/// fetcher and therefore one [`MinIntervalGate`].
pub struct Fetcher<T, C> {
    transport: T,
    gate: MinIntervalGate<C>,
    requests_sent: u64,
}

impl<T: Transport, C: Clock> Fetcher<T, C> {
    pub fn new(transport: T, clock: C, min_interval: Duration) -> Self {
        Self {
            transport,
            gate: MinIntervalGate::new(clock, min_interval),
            requests_sent: 0,
        }
    }

    /// Fetches `url` and returns its body
    ///
    /// A non-2xx status is an error, never an empty success.
    pub async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        self.gate.wait_turn().await;

        tracing::debug!("Fetching {}", url);
        let result = self.transport.get(url).await;

        self.gate.mark_finished();
        self.requests_sent += 1;

        let response = result?;
        if !(200..300).contains(&response.status) {
            return Err(FetchError::HttpStatus(response.status));
        }

        Ok(response.body)
    }

    /// Number of requests issued so far, failed ones included
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    pub fn min_interval(&self) -> Duration {
        self.gate.min_interval()
    }
}
