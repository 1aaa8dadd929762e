use serde::Deserialize;

/// Default portal the harvester points at
pub const DEFAULT_BASE_URL: &str = "https://data.nasa.gov";

/// Default output file for harvested records
pub const DEFAULT_OUTPUT_PATH: &str = "datasets.jsonl";

/// Main configuration structure for Catalog-Harvest
///
/// Every section is optional in the TOML file; missing keys take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Origin of the catalog site (scheme + host)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Minimum time between the end of one request and the start of the next (milliseconds)
    #[serde(rename = "min-interval-ms")]
    pub min_interval_ms: u64,

    /// Whole-request timeout enforced by the HTTP client (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout enforced by the HTTP client (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Also visit resource sub-pages linked from each dataset
    #[serde(rename = "follow-resources")]
    pub follow_resources: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            min_interval_ms: 1000,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            follow_resources: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "catalog-harvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/catalog-harvest/catalog-harvest".to_string(),
            contact_email: "harvest@example.org".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON Lines file records are appended to
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}
