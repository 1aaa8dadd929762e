use super::resolve::{resolve_href_url, same_origin};
use url::Url;

/// Path prefix shared by every catalog item
const DATASET_PREFIX: &str = "/dataset/";

/// Builds the listing URL for one page of a tag's result set
///
/// Shape: `{base}/dataset/?tags={tag}&page={page}`. The tag is
/// query-encoded.
pub fn listing_url(base_url: &Url, tag: &str, page: u32) -> Result<Url, url::ParseError> {
    let mut url = base_url.join(DATASET_PREFIX)?;
    url.query_pairs_mut()
        .append_pair("tags", tag)
        .append_pair("page", &page.to_string());
    Ok(url)
}

/// Resolves a listing href if it points at a dataset detail page
///
/// Accepts `/dataset/<slug>` paths on the catalog's own origin. The bare
/// `/dataset/` index and anything carrying a query string (facets, sort
/// links, pagination) are rejected.
pub fn resolve_detail_href(href: &str, base_url: &Url) -> Option<String> {
    let url = resolve_href_url(href, base_url)?;

    if !same_origin(&url, base_url) || url.query().is_some() {
        return None;
    }

    let path = url.path();
    if !path.starts_with(DATASET_PREFIX) || path.len() == DATASET_PREFIX.len() {
        return None;
    }

    Some(url.into())
}

/// True for `{base}/dataset/<slug>/resource/<id>` URLs on the catalog origin
pub fn is_resource_page(url: &str, base_url: &Url) -> bool {
    let Ok(url) = Url::parse(url) else {
        return false;
    };

    if !same_origin(&url, base_url) {
        return false;
    }

    let segments: Vec<&str> = match url.path_segments() {
        Some(segments) => segments.filter(|s| !s.is_empty()).collect(),
        None => return false,
    };

    matches!(segments.as_slice(), ["dataset", _, "resource", _])
}
