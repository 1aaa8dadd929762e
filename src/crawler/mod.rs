//! Crawler module for catalog harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching behind a minimum-interval rate limiter
//! - HTML extraction for listing and detail pages
//! - Listing pagination and visited-set deduplication
//! - Overall harvest coordination

mod coordinator;
mod detail;
mod extract;
mod fetcher;
mod ledger;
mod pagination;
mod rate_limit;
mod settings;

#[cfg(test)]
mod testing;

pub use coordinator::{run_harvest, Coordinator};
pub use detail::{DetailCrawler, DetailOutcome};
pub use extract::{
    evaluate, extract_detail, extract_listing, extract_with, parse_detail, parse_listing,
    parse_resource_downloads, Field, FieldSpec, FieldValue, Locator, DETAIL_FIELDS,
    RESOURCE_DOWNLOADS,
};
pub use fetcher::{build_http_client, Fetcher, HttpResponse, ReqwestTransport, Transport};
pub use ledger::VisitedSet;
pub use pagination::{ListingBatch, PaginationEnd, PaginationState, Paginator};
pub use rate_limit::{Clock, ManualClock, MinIntervalGate, SystemClock};
pub use settings::RunSettings;
