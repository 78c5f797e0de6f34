//! Cached, merged view of the bike-share network.
//!
//! Joins `station_status` onto `station_information` and keeps the result
//! as a single shared snapshot that is refreshed at most once per TTL.

mod cache;
mod join;
mod station;

pub use cache::{
    CacheConfig, DEFAULT_LANGUAGE, DEFAULT_REFRESH_TIMEOUT, DEFAULT_TTL, FeedUnavailable,
    SnapshotCache,
};
pub use join::merge_stations;
pub use station::{MergedStation, Snapshot, clamp_min_bikes};
