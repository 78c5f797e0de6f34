//! TTL-gated, single-flight snapshot cache.
//!
//! The cache holds at most one `Snapshot`. A snapshot younger than the TTL
//! is served without any upstream I/O. Once it expires, the first caller
//! starts a refresh on a background task and every caller arriving while
//! that refresh is in flight awaits the same result, so upstream sees one
//! discovery fetch and one pair of feed fetches per TTL window however many
//! requests arrive.
//!
//! The refresh task publishes its own result. A caller that gives up (for
//! example because its HTTP client disconnected) does not cancel it.
//!
//! A failed refresh never replaces a good snapshot: callers get the
//! previous snapshot back and only see an error when nothing was ever
//! fetched successfully.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::feed::{
    FeedClient, FeedError, STATION_INFORMATION, STATION_STATUS, StationInformation,
    StationStatus, parse_stations,
};

use super::join::merge_stations;
use super::station::{MergedStation, Snapshot, clamp_min_bikes};

/// Default snapshot TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default wall-clock budget for one refresh.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(15);

/// Default discovery document language.
pub const DEFAULT_LANGUAGE: &str = "fr";

/// Configuration for the snapshot cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a snapshot is served before a refresh is attempted.
    pub ttl: Duration,

    /// Upper bound on a single refresh, including all upstream calls.
    pub refresh_timeout: Duration,

    /// Preferred language section of the discovery document.
    pub language: String,
}

impl CacheConfig {
    /// Set the snapshot TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the refresh timeout.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Set the preferred discovery language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// No snapshot can be served: the refresh failed and nothing is cached.
#[derive(Debug, Clone, thiserror::Error)]
#[error("bike-share feed unavailable: {source}")]
pub struct FeedUnavailable {
    source: Arc<FeedError>,
}

impl FeedUnavailable {
    /// The refresh failure behind this error.
    pub fn cause(&self) -> &FeedError {
        &self.source
    }
}

type RefreshOutcome = Result<Arc<Snapshot>, Arc<FeedError>>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<Snapshot>>,
    in_flight: Option<SharedRefresh>,
}

struct Inner<C> {
    client: C,
    config: CacheConfig,
    state: Mutex<CacheState>,
}

/// Process-wide cache of the merged station view.
///
/// Cloning is cheap; clones share the same snapshot.
pub struct SnapshotCache<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for SnapshotCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: FeedClient> SnapshotCache<C> {
    /// Create an empty cache. Nothing is fetched until first use.
    pub fn new(client: C, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                config,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Current snapshot, refreshing it first if missing or expired.
    pub async fn get_snapshot(&self) -> Result<Arc<Snapshot>, FeedUnavailable> {
        let refresh = {
            let mut state = self.inner.state.lock().await;

            if let Some(snapshot) = &state.snapshot
                && snapshot.is_fresh(Instant::now(), self.inner.config.ttl)
            {
                debug!(stations = snapshot.len(), "serving cached snapshot");
                return Ok(Arc::clone(snapshot));
            }

            match state.in_flight.clone() {
                Some(refresh) => {
                    debug!("joining in-flight refresh");
                    refresh
                }
                None => {
                    let refresh = self.start_refresh();
                    state.in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };

        match refresh.await {
            Ok(snapshot) => Ok(snapshot),
            Err(source) => match self.peek().await {
                Some(stale) => {
                    warn!(
                        error = %source,
                        captured_at = %stale.captured_at(),
                        "refresh failed, serving stale snapshot"
                    );
                    Ok(stale)
                }
                None => Err(FeedUnavailable { source }),
            },
        }
    }

    /// Stations with at least `min_bikes` bikes available.
    ///
    /// Negative thresholds are treated as zero.
    pub async fn query(&self, min_bikes: i64) -> Result<Vec<MergedStation>, FeedUnavailable> {
        let snapshot = self.get_snapshot().await?;
        Ok(snapshot.with_min_bikes(clamp_min_bikes(min_bikes)))
    }

    /// A single station from the current snapshot.
    pub async fn station(&self, station_id: &str) -> Result<Option<MergedStation>, FeedUnavailable> {
        let snapshot = self.get_snapshot().await?;
        Ok(snapshot.get(station_id).cloned())
    }

    /// The cached snapshot, without triggering a refresh.
    pub async fn peek(&self) -> Option<Arc<Snapshot>> {
        self.inner.state.lock().await.snapshot.clone()
    }

    /// Spawn a refresh and return a future every waiter can share.
    fn start_refresh(&self) -> SharedRefresh {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(inner.refresh());

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(Arc::new(FeedError::Aborted {
                    message: e.to_string(),
                })),
            }
        }
        .boxed()
        .shared()
    }
}

impl<C: FeedClient> Inner<C> {
    /// Run one bounded refresh and publish the outcome.
    async fn refresh(self: Arc<Self>) -> RefreshOutcome {
        let started = Instant::now();
        let budget = self.config.refresh_timeout;

        let result = match tokio::time::timeout(
            budget,
            AssertUnwindSafe(self.fetch_stations()).catch_unwind(),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(FeedError::Aborted {
                message: "refresh panicked".to_string(),
            }),
            Err(_) => Err(FeedError::Timeout { after: budget }),
        };

        let mut state = self.state.lock().await;
        state.in_flight = None;

        match result {
            Ok(stations) => {
                let previous = state.snapshot.as_ref().map(|s| s.captured_at());
                let captured_at = monotonic_capture_time(previous, Utc::now());
                let snapshot = Arc::new(Snapshot::new(stations, captured_at, Instant::now()));
                state.snapshot = Some(Arc::clone(&snapshot));

                info!(
                    stations = snapshot.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "refreshed snapshot"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "snapshot refresh failed");
                Err(Arc::new(e))
            }
        }
    }

    /// Discovery → both feeds (concurrently) → typed records → join.
    async fn fetch_stations(&self) -> Result<Vec<MergedStation>, FeedError> {
        let discovery = self
            .client
            .fetch_discovery()
            .await
            .map_err(FeedError::discovery)?;

        let language = self.config.language.as_str();
        let information_url = discovery.feed_url(language, STATION_INFORMATION)?;
        let status_url = discovery.feed_url(language, STATION_STATUS)?;

        let (information_raw, status_raw) = futures::future::try_join(
            self.fetch_feed(STATION_INFORMATION, information_url),
            self.fetch_feed(STATION_STATUS, status_url),
        )
        .await?;

        let information =
            parse_stations::<StationInformation>(STATION_INFORMATION, information_raw)?;
        let status = parse_stations::<StationStatus>(STATION_STATUS, status_raw)?;

        if information.skipped + status.skipped > 0 {
            warn!(
                information_skipped = information.skipped,
                status_skipped = status.skipped,
                "dropped malformed station records"
            );
        }

        Ok(merge_stations(information.records, status.records))
    }

    async fn fetch_feed(&self, feed: &str, url: &str) -> Result<serde_json::Value, FeedError> {
        debug!(feed, url, "fetching feed");
        self.client
            .fetch_json(url)
            .await
            .map_err(|e| FeedError::fetch(feed, e))
    }
}

/// Capture time for a new snapshot, never earlier than the previous one.
fn monotonic_capture_time(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    previous.map_or(now, |prev| prev.max(now))
}
