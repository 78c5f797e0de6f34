//! GBFS HTTP client.

use std::time::Duration;

use serde_json::Value;

use super::error::FeedError;
use super::types::DiscoveryDocument;

/// Default discovery document (Ilévia V'Lille, Lille métropole).
pub const DEFAULT_DISCOVERY_URL: &str = "https://media.ilevia.fr/opendata/gbfs.json";

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Error bodies are truncated to this many characters.
const MAX_ERROR_BODY: usize = 200;

/// Raw retrieval of the GBFS discovery document and its feeds.
///
/// This abstraction allows the snapshot cache to be tested with mock data.
/// Each call either returns a complete result or fails; implementations
/// are expected to enforce their own per-request timeout.
pub trait FeedClient: Send + Sync + 'static {
    /// Fetch and parse the root discovery document.
    fn fetch_discovery(&self) -> impl Future<Output = Result<DiscoveryDocument, FeedError>> + Send;

    /// Fetch a feed URL listed in the discovery document as raw JSON.
    fn fetch_json(&self, url: &str) -> impl Future<Output = Result<Value, FeedError>> + Send;
}

/// Configuration for the GBFS HTTP client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// URL of the `gbfs.json` discovery document
    pub discovery_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedClientConfig {
    /// Create a new config for the given discovery document URL.
    pub fn new(discovery_url: impl Into<String>) -> Self {
        Self {
            discovery_url: discovery_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_URL)
    }
}

/// Client for a public GBFS endpoint.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    http: reqwest::Client,
    discovery_url: String,
}

impl HttpFeedClient {
    /// Create a new GBFS client.
    pub fn new(config: FeedClientConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            discovery_url: config.discovery_url,
        })
    }

    /// The discovery document URL this client reads.
    pub fn discovery_url(&self) -> &str {
        &self.discovery_url
    }

    async fn get_json(&self, url: &str) -> Result<Value, FeedError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| FeedError::Json {
            message: e.to_string(),
        })
    }
}

impl FeedClient for HttpFeedClient {
    async fn fetch_discovery(&self) -> Result<DiscoveryDocument, FeedError> {
        let raw = self.get_json(&self.discovery_url).await?;

        serde_json::from_value(raw).map_err(|e| FeedError::Json {
            message: e.to_string(),
        })
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, FeedError> {
        self.get_json(url).await
    }
}
