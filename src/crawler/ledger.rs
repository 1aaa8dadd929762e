//! Visited-set ledger
//!
//! Every detail and resource page passes through the ledger before it is
//! fetched. URLs are marked *before* the request goes out, so a page that
//! fails is still never requested a second time in the same run.

use std::collections::HashSet;

/// Set of URLs already fetched (or attempted) during this run
///
/// URLs are compared as exact strings. The set only grows and lives as long
/// as the run.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    visited: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger that already knows the given URLs
    pub fn seeded<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            visited: urls.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns false if `url` has already been marked
    pub fn should_visit(&self, url: &str) -> bool {
        !self.visited.contains(url)
    }

    pub fn mark_visited(&mut self, url: &str) {
        if !self.visited.contains(url) {
            self.visited.insert(url.to_string());
        }
    }

    /// Checks and marks in one step
    ///
    /// Returns true exactly once per distinct URL.
    pub fn check_and_mark(&mut self, url: &str) -> bool {
        if self.visited.contains(url) {
            return false;
        }
        self.visited.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
