pub mod aggregator;
pub mod providers;

pub use aggregator::{AggregatedSearch, AggregatorConfig, SearchReport};
pub use providers::{NyaaProvider, SourceError, SourceErrorKind, SourceProvider, TouchGalProvider};

use crate::config::HttpConfig;
use std::time::Duration;

/// HTTP client configuration shared by every source
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout duration
    pub timeout: Duration,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("galgame-search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl From<&HttpConfig> for HttpClientConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl HttpClientConfig {
    /// Build the reqwest client a source keeps for its lifetime
    pub fn build(&self) -> Result<reqwest::Client, SourceError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| SourceError::Unavailable(format!("Failed to create HTTP client: {e}")))
    }
}
