use serde::{Deserialize, Serialize};

/// One harvested dataset, serialized as a single JSON line
///
/// Every field is always present in the output; an absent landing page is
/// written as `null` rather than omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Detail page the record was built from
    pub dataset_url: String,

    pub title: String,

    pub description: String,

    pub tags: Vec<String>,

    /// Absolute links found in the dataset's resources section
    pub resource_links: Vec<String>,

    pub landing_page: Option<String>,

    /// Every URL fetched to build this record, detail page first
    pub text_sources: Vec<String>,
}

impl Record {
    /// Creates an empty record for a detail page
    pub fn new(dataset_url: impl Into<String>) -> Self {
        let dataset_url = dataset_url.into();
        Self {
            text_sources: vec![dataset_url.clone()],
            dataset_url,
            title: String::new(),
            description: String::new(),
            tags: Vec::new(),
            resource_links: Vec::new(),
            landing_page: None,
        }
    }
}
