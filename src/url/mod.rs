//! URL handling module for Catalog-Harvest
//!
//! This module provides listing URL construction, href resolution, and the
//! URL-shape predicates that tell detail pages and resource sub-pages apart.

mod catalog;
mod resolve;

// Re-export main functions
pub use catalog::{is_resource_page, listing_url, resolve_detail_href};
pub use resolve::{resolve_href, resolve_href_url, same_origin};
