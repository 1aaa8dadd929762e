//! Per-run harvest statistics
//!
//! This module collects the counters a run produces and prints them as a
//! human-readable summary once pagination ends.

use crate::crawler::PaginationEnd;
use crate::FetchError;
use chrono::{DateTime, Utc};

/// A detail page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub url: String,
    pub error: FetchError,
}

/// Outcome of one harvest run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Tag the run harvested
    pub tag: String,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Listing pages requested, including the final empty or failed one
    pub listing_pages_fetched: u32,

    /// Detail URLs found on listing pages, duplicates included
    pub detail_urls_discovered: u64,

    /// Detail URLs skipped because they were already visited this run
    pub duplicates_skipped: u64,

    pub records_written: u64,

    /// Resource sub-pages fetched for provenance
    pub resource_pages_fetched: u64,

    pub detail_failures: Vec<FailedItem>,

    /// Why pagination stopped; `None` while the run is in progress
    pub pagination_end: Option<PaginationEnd>,
}

impl CrawlReport {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            started_at: Utc::now(),
            finished_at: None,
            listing_pages_fetched: 0,
            detail_urls_discovered: 0,
            duplicates_skipped: 0,
            records_written: 0,
            resource_pages_fetched: 0,
            detail_failures: Vec::new(),
            pagination_end: None,
        }
    }

    pub fn record_failure(&mut self, url: &str, error: FetchError) {
        self.detail_failures.push(FailedItem {
            url: url.to_string(),
            error,
        });
    }

    /// Stamps the end of the run
    pub fn finish(&mut self, pagination_end: Option<PaginationEnd>) {
        self.pagination_end = pagination_end;
        self.finished_at = Some(Utc::now());
    }

    /// Wall time of the run, once finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }

    /// True when pagination stopped because a listing page could not be fetched
    pub fn ended_on_listing_failure(&self) -> bool {
        matches!(
            self.pagination_end,
            Some(PaginationEnd::ListingFailed { .. })
        )
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Harvest Summary ===\n");

    println!("Tag: {}", report.tag);
    if let Some(duration) = report.duration() {
        println!("Duration: {}s", duration.num_seconds());
    }
    println!();

    println!("Overview:");
    println!("  Listing pages fetched: {}", report.listing_pages_fetched);
    println!("  Dataset links found: {}", report.detail_urls_discovered);
    println!("  Duplicates skipped: {}", report.duplicates_skipped);
    println!("  Records written: {}", report.records_written);
    if report.resource_pages_fetched > 0 {
        println!("  Resource pages fetched: {}", report.resource_pages_fetched);
    }
    println!();

    match &report.pagination_end {
        Some(PaginationEnd::Exhausted { empty_page }) => {
            println!("Pagination: finished (page {} was empty)", empty_page);
        }
        Some(PaginationEnd::ListingFailed { page, error }) => {
            println!("Pagination: stopped at page {} ({})", page, error);
        }
        None => println!("Pagination: did not finish"),
    }
    println!();

    if !report.detail_failures.is_empty() {
        println!("Failed Datasets ({}):", report.detail_failures.len());
        for failure in &report.detail_failures {
            println!("  - {} [{}] {}", failure.url, failure.error.kind(), failure.error);
        }
        println!();
    }
}
