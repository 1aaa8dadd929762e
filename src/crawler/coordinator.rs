//! Harvest coordinator - main crawl orchestration logic
//!
//! This module contains the main harvest loop that ties together:
//! - The pagination driver, which yields detail URLs page by page
//! - The visited-set ledger, which filters them
//! - The detail crawler, which fetches and extracts records
//! - The record sink, which persists each record as it is produced
//!
//! It also owns the failure policy. A detail page that cannot be fetched is
//! logged, counted and skipped. A listing page that cannot be fetched ends
//! the run normally. Only setup errors and sink errors are returned as `Err`.

use crate::config::Config;
use crate::crawler::detail::{DetailCrawler, DetailOutcome};
use crate::crawler::fetcher::{build_http_client, Fetcher, ReqwestTransport, Transport};
use crate::crawler::ledger::VisitedSet;
use crate::crawler::pagination::Paginator;
use crate::crawler::rate_limit::{Clock, SystemClock};
use crate::crawler::settings::RunSettings;
use crate::output::{CrawlReport, JsonlSink, RecordSink};
use crate::HarvestError;
use std::path::Path;

/// Characters of a title shown in progress logs
const TITLE_PREVIEW_CHARS: usize = 60;

/// Main harvest coordinator
///
/// Owns every piece of mutable run state: the fetcher (and with it the rate
/// limiter's clock), the visited-set ledger, and the record sink.
pub struct Coordinator<T, C, S> {
    settings: RunSettings,
    fetcher: Fetcher<T, C>,
    ledger: VisitedSet,
    sink: S,
}

impl<S: RecordSink> Coordinator<ReqwestTransport, SystemClock, S> {
    /// Creates a coordinator that talks HTTP through `reqwest` on wall-clock time
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(settings: RunSettings, sink: S) -> Result<Self, HarvestError> {
        let client = build_http_client(
            &settings.user_agent,
            settings.request_timeout,
            settings.connect_timeout,
        )?;

        Ok(Self::with_parts(
            settings,
            ReqwestTransport::new(client),
            SystemClock,
            sink,
        ))
    }
}

impl<T: Transport, C: Clock, S: RecordSink> Coordinator<T, C, S> {
    /// Creates a coordinator from explicit collaborators
    pub fn with_parts(settings: RunSettings, transport: T, clock: C, sink: S) -> Self {
        let fetcher = Fetcher::new(transport, clock, settings.min_interval);
        Self {
            settings,
            fetcher,
            ledger: VisitedSet::new(),
            sink,
        }
    }

    /// Replaces the ledger, e.g. with one seeded with known URLs
    pub fn with_ledger(mut self, ledger: VisitedSet) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn ledger(&self) -> &VisitedSet {
        &self.ledger
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs the harvest until pagination terminates
    ///
    /// Each listing page's detail URLs are crawled, in discovery order,
    /// before the next listing page is requested.
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        let mut report = CrawlReport::new(self.settings.tag.clone());
        let mut paginator =
            Paginator::new(self.settings.base_url.clone(), self.settings.tag.clone());
        let details = DetailCrawler::new(
            self.settings.base_url.clone(),
            self.settings.follow_resources,
        );

        tracing::info!(
            "Starting harvest of tag '{}' from {} (min interval {:?})",
            self.settings.tag,
            self.settings.base_url,
            self.fetcher.min_interval()
        );

        while let Some(batch) = paginator.next_batch(&mut self.fetcher).await {
            let total = batch.links.len();
            report.detail_urls_discovered += total as u64;

            for (index, url) in batch.links.iter().enumerate() {
                tracing::debug!("[page {} {}/{}] {}", batch.page, index + 1, total, url);

                match details.crawl(&mut self.fetcher, &mut self.ledger, url).await {
                    DetailOutcome::Skipped => {
                        report.duplicates_skipped += 1;
                    }
                    DetailOutcome::Failed(error) => {
                        tracing::warn!(
                            "Failed to fetch {} ({}): {}; skipping",
                            url,
                            error.kind(),
                            error
                        );
                        report.record_failure(url, error);
                    }
                    DetailOutcome::Harvested(record) => {
                        self.sink.write_record(&record)?;
                        report.records_written += 1;
                        report.resource_pages_fetched +=
                            record.text_sources.len().saturating_sub(1) as u64;
                        tracing::info!("Saved: {}", title_preview(&record.title, url));
                    }
                }
            }
        }

        report.listing_pages_fetched = paginator.pages_requested();
        report.finish(paginator.end().cloned());

        tracing::info!(
            "Harvest finished: {} records written, {} failed, {} duplicates skipped, {} requests",
            report.records_written,
            report.detail_failures.len(),
            report.duplicates_skipped,
            self.fetcher.requests_sent()
        );

        Ok(report)
    }
}

fn title_preview(title: &str, url: &str) -> String {
    if title.is_empty() {
        return format!("(untitled) {}", url);
    }

    if title.chars().count() > TITLE_PREVIEW_CHARS {
        let cut: String = title.chars().take(TITLE_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

/// Runs a complete harvest for `tag`, appending records to `out_path`
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Pagination reached its end (per-item failures are in the report)
/// * `Err(HarvestError)` - The run could not start, or records could not be written
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::Config;
/// use catalog_harvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_harvest(&Config::default(), "cassini", Path::new("datasets.jsonl")).await?;
/// println!("{} records", report.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: &Config,
    tag: &str,
    out_path: &Path,
) -> Result<CrawlReport, HarvestError> {
    let settings = RunSettings::from_config(config, tag)?;
    let sink = JsonlSink::open(out_path)?;
    let mut coordinator = Coordinator::new(settings, sink)?;
    coordinator.run().await
}
