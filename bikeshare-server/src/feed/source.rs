//! Runtime choice between the live feed and local fixtures.

use serde_json::Value;

use super::client::{FeedClient, HttpFeedClient};
use super::error::FeedError;
use super::mock::MockFeedClient;
use super::types::DiscoveryDocument;

/// The feed client the server runs against.
#[derive(Clone)]
pub enum FeedSource {
    /// Live GBFS endpoint
    Http(HttpFeedClient),
    /// Fixtures served from memory
    Mock(MockFeedClient),
}

impl FeedSource {
    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            FeedSource::Http(client) => client.discovery_url().to_string(),
            FeedSource::Mock(_) => "mock fixtures".to_string(),
        }
    }
}

impl FeedClient for FeedSource {
    async fn fetch_discovery(&self) -> Result<DiscoveryDocument, FeedError> {
        match self {
            FeedSource::Http(client) => client.fetch_discovery().await,
            FeedSource::Mock(client) => client.fetch_discovery().await,
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, FeedError> {
        match self {
            FeedSource::Http(client) => client.fetch_json(url).await,
            FeedSource::Mock(client) => client.fetch_json(url).await,
        }
    }
}

impl From<HttpFeedClient> for FeedSource {
    fn from(client: HttpFeedClient) -> Self {
        FeedSource::Http(client)
    }
}

impl From<MockFeedClient> for FeedSource {
    fn from(client: MockFeedClient) -> Self {
        FeedSource::Mock(client)
    }
}
