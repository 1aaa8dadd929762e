use crate::config::{Config, UserAgentConfig};
use crate::{ConfigError, HarvestError};
use std::time::Duration;
use url::Url;

/// Runtime view of the configuration for a single harvest
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Tag being harvested
    pub tag: String,

    pub base_url: Url,

    /// Minimum gap between the end of one request and the start of the next
    pub min_interval: Duration,

    pub request_timeout: Duration,

    pub connect_timeout: Duration,

    pub follow_resources: bool,

    pub user_agent: UserAgentConfig,
}

impl RunSettings {
    /// Builds run settings for `tag` from a loaded configuration
    pub fn from_config(config: &Config, tag: impl Into<String>) -> Result<Self, HarvestError> {
        let tag = tag.into().trim().to_string();
        if tag.is_empty() {
            return Err(ConfigError::Validation("tag cannot be empty".to_string()).into());
        }

        Ok(Self {
            tag,
            base_url: Url::parse(&config.crawler.base_url)?,
            min_interval: Duration::from_millis(config.crawler.min_interval_ms),
            request_timeout: Duration::from_secs(config.crawler.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.crawler.connect_timeout_secs),
            follow_resources: config.crawler.follow_resources,
            user_agent: config.user_agent.clone(),
        })
    }
}
