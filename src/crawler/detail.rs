//! Per-dataset detail crawling
//!
//! One detail URL goes in; out comes a skip, a fetch failure, or a finished
//! [`Record`]. Failures are returned to the caller rather than logged here,
//! because what to do about them is the coordinator's policy.

use crate::crawler::extract::{parse_detail, parse_resource_downloads};
use crate::crawler::fetcher::{Fetcher, Transport};
use crate::crawler::ledger::VisitedSet;
use crate::crawler::rate_limit::Clock;
use crate::output::Record;
use crate::url::is_resource_page;
use crate::FetchError;
use url::Url;

/// Result of crawling one detail URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    /// Already visited this run; nothing was fetched
    Skipped,

    /// The detail page could not be fetched
    Failed(FetchError),

    Harvested(Record),
}

/// Fetches detail pages and turns them into records
#[derive(Debug, Clone)]
pub struct DetailCrawler {
    base_url: Url,
    follow_resources: bool,
}

impl DetailCrawler {
    pub fn new(base_url: Url, follow_resources: bool) -> Self {
        Self {
            base_url,
            follow_resources,
        }
    }

    /// Crawls one detail URL
    ///
    /// The URL is marked visited before the request is sent.
    pub async fn crawl<T: Transport, C: Clock>(
        &self,
        fetcher: &mut Fetcher<T, C>,
        ledger: &mut VisitedSet,
        url: &str,
    ) -> DetailOutcome {
        if !ledger.check_and_mark(url) {
            tracing::debug!("Already visited, skipping: {}", url);
            return DetailOutcome::Skipped;
        }

        let body = match fetcher.fetch(url).await {
            Ok(body) => body,
            Err(error) => return DetailOutcome::Failed(error),
        };

        let mut record = parse_detail(&body, url, &self.base_url);

        if self.follow_resources {
            self.visit_resource_pages(fetcher, ledger, &mut record).await;
        }

        DetailOutcome::Harvested(record)
    }

    /// Visits resource sub-pages linked from the record
    ///
    /// Each page fetched is added to `text_sources`; download links it
    /// exposes are appended to `resource_links`. A failed sub-page only
    /// costs its own contribution.
    async fn visit_resource_pages<T: Transport, C: Clock>(
        &self,
        fetcher: &mut Fetcher<T, C>,
        ledger: &mut VisitedSet,
        record: &mut Record,
    ) {
        let pages: Vec<String> = record
            .resource_links
            .iter()
            .filter(|link| is_resource_page(link, &self.base_url))
            .cloned()
            .collect();

        for page in pages {
            if !ledger.check_and_mark(&page) {
                tracing::debug!("Already visited resource page, skipping: {}", page);
                continue;
            }

            match fetcher.fetch(&page).await {
                Ok(body) => {
                    for link in parse_resource_downloads(&body, &self.base_url) {
                        if !record.resource_links.contains(&link) {
                            record.resource_links.push(link);
                        }
                    }
                    record.text_sources.push(page);
                }
                Err(error) => {
                    tracing::warn!(
                        "Resource page {} failed ({}): {}",
                        page,
                        error.kind(),
                        error
                    );
                }
            }
        }
    }
}
