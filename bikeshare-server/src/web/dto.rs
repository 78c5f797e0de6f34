//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::snapshot::MergedStation;

/// Query string of the station listing.
#[derive(Debug, Default, Deserialize)]
pub struct StationsQuery {
    /// Minimum number of available bikes (defaults to 0)
    pub min_bikes: Option<String>,
}

impl StationsQuery {
    /// The requested threshold.
    ///
    /// Missing, empty or non-numeric values mean "no threshold". Negative
    /// values are passed through and clamped by the cache.
    pub fn min_bikes(&self) -> i64 {
        let Some(raw) = self.min_bikes.as_deref().map(str::trim) else {
            return 0;
        };
        if raw.is_empty() {
            return 0;
        }

        match raw.parse::<i64>() {
            Ok(n) => n,
            // Too large for i64: above any bike count, so it matches nothing.
            Err(_) if raw.bytes().all(|b| b.is_ascii_digit()) => i64::MAX,
            Err(e) => {
                debug!(min_bikes = raw, error = %e, "ignoring unparsable min_bikes");
                0
            }
        }
    }
}

/// A station in API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationResult {
    /// GBFS station id
    pub id: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,

    /// Street address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Available bikes (unreported counts as 0)
    pub bikes: u32,

    /// Available docks (unreported counts as 0)
    pub docks: u32,

    /// Installed docks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,

    /// Unix seconds of the station's last report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reported: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_renting: Option<bool>,
}

impl StationResult {
    /// Convert a merged station to its wire form.
    pub fn from_station(station: &MergedStation) -> Self {
        Self {
            id: station.station_id.clone(),
            name: station.name.clone(),
            lat: station.lat,
            lon: station.lon,
            address: station.address.clone(),
            bikes: station.bikes(),
            docks: station.num_docks_available.unwrap_or(0),
            capacity: station.capacity,
            last_reported: station.last_reported,
            is_renting: station.is_renting,
        }
    }
}

/// Snapshot metadata, reported without triggering a refresh.
#[derive(Debug, Serialize)]
pub struct CacheStatusResponse {
    /// Whether a snapshot is cached
    pub cached: bool,

    /// Number of stations in the cached snapshot
    pub station_count: usize,

    /// When the cached snapshot was captured (RFC 3339)
    pub captured_at: Option<String>,

    /// Seconds since the cached snapshot was fetched
    pub age_secs: Option<u64>,

    /// Configured TTL in seconds
    pub ttl_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
