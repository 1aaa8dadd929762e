//! In-memory collaborators for crawler unit tests

use crate::crawler::fetcher::{HttpResponse, Transport};
use crate::crawler::rate_limit::{Clock, ManualClock};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Transport answering from a fixed URL → response table
///
/// Unknown URLs answer 404. Every request is logged in order.
pub(crate) struct ScriptedTransport {
    responses: HashMap<String, Result<HttpResponse, FetchError>>,
    requests: Mutex<Vec<String>>,
    starts: Mutex<Vec<Instant>>,
    clock: Option<Arc<ManualClock>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: Mutex::new(Vec::new()),
            starts: Mutex::new(Vec::new()),
            clock: None,
            latency: Duration::ZERO,
        }
    }

    /// Stamps request starts with `clock` and advances it by the latency
    pub(crate) fn with_clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(
            url.into(),
            Ok(HttpResponse {
                status: 200,
                body: body.into(),
            }),
        );
        self
    }

    pub(crate) fn status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.responses.insert(
            url.into(),
            Ok(HttpResponse {
                status,
                body: String::new(),
            }),
        );
        self
    }

    pub(crate) fn error(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_starts(&self) -> Vec<Instant> {
        self.starts.lock().unwrap().clone()
    }

    pub(crate) fn count_requests(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| u.as_str() == url).count()
    }

    pub(crate) fn count_containing(&self, needle: &str) -> usize {
        self.requests().iter().filter(|u| u.contains(needle)).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(clock) = &self.clock {
            self.starts.lock().unwrap().push(clock.now());
            clock.advance(self.latency);
        }

        match self.responses.get(url) {
            Some(response) => response.clone(),
            None => Ok(HttpResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Listing page markup with one dataset heading per slug
pub(crate) fn listing_html(slugs: &[String]) -> String {
    let items: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<li class="dataset-item"><h2 class="dataset-heading"><a href="/dataset/{slug}">{slug}</a></h2></li>"#
            )
        })
        .collect();

    format!(r#"<html><body><ul class="dataset-list">{items}</ul></body></html>"#)
}

/// Minimal detail page markup
pub(crate) fn detail_html(title: &str) -> String {
    format!(
        r#"<html><body>
        <h1>{title}</h1>
        <div class="notes embedded-content"><p>About {title}.</p></div>
        <ul class="tag-list"><li><a href="/dataset/?tags=cassini">cassini</a></li></ul>
        </body></html>"#
    )
}
