//! HTML extraction for listing, detail, and resource pages
//!
//! Detail pages are described by a declarative table, [`DETAIL_FIELDS`],
//! mapping each record field to a [`Locator`]. One interpreter,
//! [`evaluate`], runs any locator against a document, so adding a field is a
//! table entry rather than new lookup code.
//!
//! Nothing here fails. A missing element or a selector that does not parse
//! degrades that one field to its empty default and extraction moves on.

use crate::output::Record;
use crate::url::{resolve_detail_href, resolve_href};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Anchors that lead from a listing page to dataset detail pages
const LISTING_LINKS: &str = ".dataset-heading a[href]";

/// Record fields filled from a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Tags,
    ResourceLinks,
    LandingPage,
}

/// How to find a field's value in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Text of the first element matching the selector
    FirstText(&'static str),

    /// Paragraph texts inside the first matching container
    ///
    /// Falls back to the container's own text when it holds no paragraphs.
    ContainerParagraphs {
        container: &'static str,
        paragraph: &'static str,
    },

    /// Non-empty text of every matching anchor, in document order
    AnchorTexts(&'static str),

    /// Resolved `href` of every matching anchor, first occurrence wins
    AnchorHrefs(&'static str),

    /// Value cell of the first table row whose header matches a label
    KeyedRow {
        rows: &'static str,
        labels: &'static [&'static str],
    },
}

/// One row of an extraction table
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub locator: Locator,
}

/// Detail-page extraction table for CKAN dataset pages
pub const DETAIL_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: Field::Title,
        locator: Locator::FirstText("h1"),
    },
    FieldSpec {
        field: Field::Description,
        locator: Locator::ContainerParagraphs {
            container: "div.notes",
            paragraph: "p",
        },
    },
    FieldSpec {
        field: Field::Tags,
        locator: Locator::AnchorTexts("ul.tag-list a"),
    },
    FieldSpec {
        field: Field::ResourceLinks,
        locator: Locator::AnchorHrefs("section#dataset-resources a[href]"),
    },
    FieldSpec {
        field: Field::LandingPage,
        locator: Locator::KeyedRow {
            rows: "table tr",
            labels: &["landing_page", "Landing Page", "landingpage"],
        },
    },
];

/// Direct download links on a resource sub-page
pub const RESOURCE_DOWNLOADS: Locator =
    Locator::AnchorHrefs("a.resource-url-analytics[href], p.text-muted a[href]");

/// Value produced by a locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Optional(Option<String>),
}

impl FieldValue {
    /// True when the locator found nothing
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Optional(value) => value.is_none(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::List(items) => items.join(" "),
            FieldValue::Optional(value) => value.unwrap_or_default(),
        }
    }

    pub fn into_list(self) -> Vec<String> {
        match self {
            FieldValue::Text(text) if text.is_empty() => Vec::new(),
            FieldValue::Text(text) => vec![text],
            FieldValue::List(items) => items,
            FieldValue::Optional(value) => value.into_iter().collect(),
        }
    }

    pub fn into_optional(self) -> Option<String> {
        match self {
            FieldValue::Text(text) => Some(text).filter(|t| !t.is_empty()),
            FieldValue::List(items) => items.into_iter().next(),
            FieldValue::Optional(value) => value,
        }
    }
}

/// Extracts dataset detail URLs from listing page HTML
///
/// Order follows the document and duplicates are kept; deduplication is the
/// ledger's job.
pub fn parse_listing(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    extract_listing(&document, base_url)
}

/// Extracts dataset detail URLs from a parsed listing page
pub fn extract_listing(document: &Html, base_url: &Url) -> Vec<String> {
    let Some(selector) = selector(LISTING_LINKS) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_detail_href(href, base_url))
        .collect()
}

/// Builds a record from detail page HTML
pub fn parse_detail(html: &str, source_url: &str, base_url: &Url) -> Record {
    let document = Html::parse_document(html);
    extract_detail(&document, source_url, base_url)
}

/// Builds a record from a parsed detail page using [`DETAIL_FIELDS`]
pub fn extract_detail(document: &Html, source_url: &str, base_url: &Url) -> Record {
    extract_with(DETAIL_FIELDS, document, source_url, base_url)
}

/// Builds a record by running every entry of `fields` against `document`
pub fn extract_with(
    fields: &[FieldSpec],
    document: &Html,
    source_url: &str,
    base_url: &Url,
) -> Record {
    let mut record = Record::new(source_url);

    for spec in fields {
        let value = evaluate(document, &spec.locator, base_url);
        if value.is_empty() {
            tracing::debug!("Extraction gap: {:?} not found on {}", spec.field, source_url);
        }

        match spec.field {
            Field::Title => record.title = value.into_text(),
            Field::Description => record.description = value.into_text(),
            Field::Tags => record.tags = value.into_list(),
            Field::ResourceLinks => record.resource_links = value.into_list(),
            Field::LandingPage => record.landing_page = value.into_optional(),
        }
    }

    record
}

/// Extracts direct download links from resource sub-page HTML
pub fn parse_resource_downloads(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    evaluate(&document, &RESOURCE_DOWNLOADS, base_url).into_list()
}

/// Runs a single locator against a document
pub fn evaluate(document: &Html, locator: &Locator, base_url: &Url) -> FieldValue {
    match *locator {
        Locator::FirstText(css) => {
            let text = selector(css)
                .and_then(|sel| document.select(&sel).next().map(element_text))
                .unwrap_or_default();
            FieldValue::Text(text)
        }

        Locator::ContainerParagraphs {
            container,
            paragraph,
        } => {
            let Some(root) = selector(container).and_then(|sel| document.select(&sel).next())
            else {
                return FieldValue::Text(String::new());
            };

            let paragraphs: Vec<String> = selector(paragraph)
                .map(|sel| {
                    root.select(&sel)
                        .map(element_text)
                        .filter(|text| !text.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            if paragraphs.is_empty() {
                FieldValue::Text(element_text(root))
            } else {
                FieldValue::Text(paragraphs.join("\n\n"))
            }
        }

        Locator::AnchorTexts(css) => {
            let texts = selector(css)
                .map(|sel| {
                    document
                        .select(&sel)
                        .map(element_text)
                        .filter(|text| !text.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            FieldValue::List(texts)
        }

        Locator::AnchorHrefs(css) => {
            let mut links: Vec<String> = Vec::new();
            if let Some(sel) = selector(css) {
                for anchor in document.select(&sel) {
                    let resolved = anchor
                        .value()
                        .attr("href")
                        .and_then(|href| resolve_href(href, base_url));
                    if let Some(link) = resolved {
                        if !links.contains(&link) {
                            links.push(link);
                        }
                    }
                }
            }
            FieldValue::List(links)
        }

        Locator::KeyedRow { rows, labels } => {
            FieldValue::Optional(keyed_row_value(document, rows, labels))
        }
    }
}

/// Finds the value cell of the first row labelled with one of `labels`
fn keyed_row_value(document: &Html, rows: &str, labels: &[&str]) -> Option<String> {
    let row_selector = selector(rows)?;
    let header_selector = selector("th")?;
    let cell_selector = selector("td")?;
    let link_selector = selector("a[href]")?;

    let wanted: Vec<String> = labels.iter().map(|label| normalize_label(label)).collect();

    for row in document.select(&row_selector) {
        let (Some(header), Some(cell)) = (
            row.select(&header_selector).next(),
            row.select(&cell_selector).next(),
        ) else {
            continue;
        };

        if !wanted.contains(&normalize_label(&element_text(header))) {
            continue;
        }

        let value = cell
            .select(&link_selector)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(|href| href.trim().to_string())
            .unwrap_or_else(|| element_text(cell));

        return Some(value).filter(|v| !v.is_empty());
    }

    None
}

/// Lowercases a row label and treats `_` like a space
fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Element text with whitespace runs collapsed to single spaces
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}
