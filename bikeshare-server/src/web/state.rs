//! Application state for the web layer.

use crate::feed::FeedSource;
use crate::snapshot::SnapshotCache;

/// Shared application state.
///
/// `SnapshotCache` is itself a cheap shared handle, so cloning the state per
/// request does not copy any station data.
#[derive(Clone)]
pub struct AppState {
    /// Merged station snapshot
    pub snapshots: SnapshotCache<FeedSource>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(snapshots: SnapshotCache<FeedSource>) -> Self {
        Self { snapshots }
    }
}
