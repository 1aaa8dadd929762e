//! Output module for harvested records and run summaries
//!
//! This module handles:
//! - The [`Record`] shape written for every dataset
//! - Appending records to a JSON Lines file
//! - Recording and printing per-run statistics

mod jsonl;
mod record;
pub mod stats;

pub use jsonl::{JsonlSink, RecordSink};
pub use record::Record;
pub use stats::{print_report, CrawlReport, FailedItem};
