//! Listing-page pagination driver
//!
//! Walks `?tags=<tag>&page=1, 2, 3, ...` until a page comes back with no
//! dataset links. There is no page cap. A listing page that cannot be fetched
//! ends pagination on the spot: later pages are not tried, since a broken
//! index says nothing about whether more data follows.

use crate::crawler::extract::parse_listing;
use crate::crawler::fetcher::{Fetcher, Transport};
use crate::crawler::rate_limit::Clock;
use crate::url::listing_url;
use crate::FetchError;
use url::Url;

/// Why pagination stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationEnd {
    /// A listing page was fetched and held no dataset links
    Exhausted { empty_page: u32 },

    /// A listing page could not be fetched
    ListingFailed { page: u32, error: FetchError },
}

/// Pagination state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    /// Next listing page to fetch
    AwaitPage(u32),

    Terminated(PaginationEnd),
}

/// Detail URLs found on one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingBatch {
    pub page: u32,
    pub links: Vec<String>,
}

/// Drives the listing loop for one tag
#[derive(Debug)]
pub struct Paginator {
    base_url: Url,
    tag: String,
    state: PaginationState,
    pages_requested: u32,
}

impl Paginator {
    pub fn new(base_url: Url, tag: impl Into<String>) -> Self {
        Self {
            base_url,
            tag: tag.into(),
            state: PaginationState::AwaitPage(1),
            pages_requested: 0,
        }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Termination reason, once pagination has stopped
    pub fn end(&self) -> Option<&PaginationEnd> {
        match &self.state {
            PaginationState::Terminated(end) => Some(end),
            PaginationState::AwaitPage(_) => None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.end().is_some()
    }

    /// Listing pages requested so far, including the final empty or failed one
    pub fn pages_requested(&self) -> u32 {
        self.pages_requested
    }

    /// Fetches the next listing page and returns its detail links
    ///
    /// Returns `None` once pagination has terminated; the reason is then
    /// available from [`Paginator::end`].
    pub async fn next_batch<T: Transport, C: Clock>(
        &mut self,
        fetcher: &mut Fetcher<T, C>,
    ) -> Option<ListingBatch> {
        let page = match self.state {
            PaginationState::AwaitPage(page) => page,
            PaginationState::Terminated(_) => return None,
        };

        let url = match listing_url(&self.base_url, &self.tag, page) {
            Ok(url) => url,
            Err(e) => {
                let error = FetchError::TransportFailure(format!("bad listing URL: {}", e));
                return self.fail(page, error);
            }
        };

        tracing::info!("Listing page {}: {}", page, url);
        self.pages_requested += 1;

        let body = match fetcher.fetch(url.as_str()).await {
            Ok(body) => body,
            Err(error) => return self.fail(page, error),
        };

        let links = parse_listing(&body, &self.base_url);
        if links.is_empty() {
            tracing::info!("Listing page {} has no datasets, end of results", page);
            self.state = PaginationState::Terminated(PaginationEnd::Exhausted { empty_page: page });
            return None;
        }

        tracing::info!("Listing page {}: found {} datasets", page, links.len());
        self.state = PaginationState::AwaitPage(page + 1);
        Some(ListingBatch { page, links })
    }

    fn fail(&mut self, page: u32, error: FetchError) -> Option<ListingBatch> {
        tracing::warn!(
            "Listing page {} failed ({}): {}; stopping pagination",
            page,
            error.kind(),
            error
        );
        self.state = PaginationState::Terminated(PaginationEnd::ListingFailed { page, error });
        None
    }
}
