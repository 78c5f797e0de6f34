//! Mock GBFS client for testing without network access.
//!
//! Serves station feeds from memory (or from JSON files on disk) as if they
//! were live API responses. Every call is counted, and failures and latency
//! can be injected at runtime.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::RwLock;

use super::client::FeedClient;
use super::error::FeedError;
use super::types::{DiscoveryDocument, STATION_INFORMATION, STATION_STATUS};

/// URL under which the mock serves `station_information`.
pub const MOCK_INFORMATION_URL: &str = "mock://station_information.json";

/// URL under which the mock serves `station_status`.
pub const MOCK_STATUS_URL: &str = "mock://station_status.json";

/// Mock GBFS client that serves data from memory.
///
/// Cloning is cheap and clones share state, so a test can keep a handle
/// for assertions after moving a clone into the cache.
#[derive(Clone, Default)]
pub struct MockFeedClient {
    inner: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    discovery: RwLock<Value>,
    feeds: RwLock<HashMap<String, Value>>,
    failing_urls: RwLock<HashSet<String>>,
    fetch_counts: RwLock<HashMap<String, usize>>,
    discovery_calls: AtomicUsize,
    fail_discovery: AtomicBool,
    latency_ms: AtomicU64,
}

impl MockFeedClient {
    /// Create a mock whose discovery document lists both station feeds.
    pub fn new(information: Value, status: Value) -> Self {
        let discovery = json!({
            "last_updated": 0,
            "ttl": 0,
            "data": { "en": { "feeds": [
                { "name": STATION_INFORMATION, "url": MOCK_INFORMATION_URL },
                { "name": STATION_STATUS, "url": MOCK_STATUS_URL }
            ] } }
        });

        let feeds = HashMap::from([
            (MOCK_INFORMATION_URL.to_string(), information),
            (MOCK_STATUS_URL.to_string(), status),
        ]);

        Self::with_discovery(discovery, feeds)
    }

    /// Create a mock from an arbitrary discovery document and URL → payload map.
    pub fn with_discovery(discovery: Value, feeds: HashMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(MockState {
                discovery: RwLock::new(discovery),
                feeds: RwLock::new(feeds),
                ..MockState::default()
            }),
        }
    }

    /// Create a mock by loading JSON files from a directory.
    ///
    /// Expects `station_information.json` and `station_status.json`.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let data_dir = data_dir.as_ref();
        let information = read_fixture(data_dir, STATION_INFORMATION)?;
        let status = read_fixture(data_dir, STATION_STATUS)?;
        Ok(Self::new(information, status))
    }

    /// Replace the payload served for a URL.
    pub async fn set_feed(&self, url: &str, payload: Value) {
        let mut feeds = self.inner.feeds.write().await;
        feeds.insert(url.to_string(), payload);
    }

    /// Replace the discovery document.
    pub async fn set_discovery(&self, discovery: Value) {
        let mut guard = self.inner.discovery.write().await;
        *guard = discovery;
    }

    /// Make discovery fetches fail (or succeed again).
    pub fn set_fail_discovery(&self, fail: bool) {
        self.inner.fail_discovery.store(fail, Ordering::SeqCst);
    }

    /// Make fetches of `url` fail (or succeed again).
    pub async fn set_fail_feed(&self, url: &str, fail: bool) {
        let mut failing = self.inner.failing_urls.write().await;
        if fail {
            failing.insert(url.to_string());
        } else {
            failing.remove(url);
        }
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.inner.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of `fetch_discovery` calls so far.
    pub fn discovery_calls(&self) -> usize {
        self.inner.discovery_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_json` calls for `url` so far.
    pub async fn feed_calls(&self, url: &str) -> usize {
        let counts = self.inner.fetch_counts.read().await;
        counts.get(url).copied().unwrap_or(0)
    }

    /// Number of `station_information` fetches so far.
    pub async fn information_calls(&self) -> usize {
        self.feed_calls(MOCK_INFORMATION_URL).await
    }

    /// Number of `station_status` fetches so far.
    pub async fn status_calls(&self) -> usize {
        self.feed_calls(MOCK_STATUS_URL).await
    }

    async fn simulate_latency(&self) {
        let millis = self.inner.latency_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

impl FeedClient for MockFeedClient {
    async fn fetch_discovery(&self) -> Result<DiscoveryDocument, FeedError> {
        self.inner.discovery_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.inner.fail_discovery.load(Ordering::SeqCst) {
            return Err(FeedError::Api {
                status: 503,
                message: "mock discovery failure".to_string(),
            });
        }

        let raw = self.inner.discovery.read().await.clone();
        serde_json::from_value(raw).map_err(|e| FeedError::Json {
            message: e.to_string(),
        })
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, FeedError> {
        {
            let mut counts = self.inner.fetch_counts.write().await;
            *counts.entry(url.to_string()).or_insert(0) += 1;
        }
        self.simulate_latency().await;

        if self.inner.failing_urls.read().await.contains(url) {
            return Err(FeedError::Api {
                status: 503,
                message: format!("mock failure for {url}"),
            });
        }

        let feeds = self.inner.feeds.read().await;
        feeds.get(url).cloned().ok_or_else(|| FeedError::Api {
            status: 404,
            message: format!(
                "No mock data for {url}. Available: {:?}",
                feeds.keys().collect::<Vec<_>>()
            ),
        })
    }
}

fn read_fixture(data_dir: &Path, feed: &str) -> Result<Value, FeedError> {
    let path = data_dir.join(format!("{feed}.json"));

    let json = std::fs::read_to_string(&path).map_err(|e| FeedError::Fetch {
        feed: feed.to_string(),
        message: format!("Failed to read {:?}: {}", path, e),
    })?;

    serde_json::from_str(&json).map_err(|e| FeedError::Fetch {
        feed: feed.to_string(),
        message: format!("Failed to parse {:?}: {}", path, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_feed() -> Value {
        json!({ "data": { "stations": [] } })
    }

    #[tokio::test]
    async fn serves_discovery_listing_both_feeds() {
        let client = MockFeedClient::new(empty_feed(), empty_feed());

        let doc = client.fetch_discovery().await.unwrap();

        assert_eq!(
            doc.feed_url("fr", STATION_INFORMATION).unwrap(),
            MOCK_INFORMATION_URL
        );
        assert_eq!(doc.feed_url("fr", STATION_STATUS).unwrap(), MOCK_STATUS_URL);
        assert_eq!(client.discovery_calls(), 1);
    }

    #[tokio::test]
    async fn counts_feed_calls_per_url() {
        let client = MockFeedClient::new(empty_feed(), empty_feed());

        client.fetch_json(MOCK_STATUS_URL).await.unwrap();
        client.fetch_json(MOCK_STATUS_URL).await.unwrap();
        client.fetch_json(MOCK_INFORMATION_URL).await.unwrap();

        assert_eq!(client.status_calls().await, 2);
        assert_eq!(client.information_calls().await, 1);
    }

    #[tokio::test]
    async fn unknown_url_returns_error() {
        let client = MockFeedClient::new(empty_feed(), empty_feed());

        let result = client.fetch_json("mock://free_bike_status.json").await;

        assert!(matches!(result, Err(FeedError::Api { status: 404, .. })));
    }

    #[tokio::test]
    async fn injected_failures_can_be_cleared() {
        let client = MockFeedClient::new(empty_feed(), empty_feed());

        client.set_fail_discovery(true);
        client.set_fail_feed(MOCK_STATUS_URL, true).await;
        assert!(client.fetch_discovery().await.is_err());
        assert!(client.fetch_json(MOCK_STATUS_URL).await.is_err());

        client.set_fail_discovery(false);
        client.set_fail_feed(MOCK_STATUS_URL, false).await;
        assert!(client.fetch_discovery().await.is_ok());
        assert!(client.fetch_json(MOCK_STATUS_URL).await.is_ok());
    }

    #[tokio::test]
    async fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("station_information.json"),
            r#"{"data":{"stations":[{"station_id":"A","name":"Gare","lat":50.63,"lon":3.07}]}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("station_status.json"),
            r#"{"data":{"stations":[{"station_id":"A","num_bikes_available":5}]}}"#,
        )
        .unwrap();

        let client = MockFeedClient::from_dir(dir.path()).unwrap();
        let status = client.fetch_json(MOCK_STATUS_URL).await.unwrap();

        assert_eq!(status["data"]["stations"][0]["num_bikes_available"], 5);
    }

    #[test]
    fn missing_directory_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();

        let result = MockFeedClient::from_dir(dir.path());

        assert!(
            matches!(result, Err(FeedError::Fetch { ref feed, .. }) if feed == STATION_INFORMATION)
        );
    }
}
