//! Merged station records and the snapshot that holds them.

use chrono::{DateTime, Utc};
use tokio::time::{Duration, Instant};

/// A station as served to clients: live status plus descriptive metadata.
///
/// Status is authoritative for existence, so descriptive fields are `None`
/// when the information feed has no matching record.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedStation {
    pub station_id: String,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address: Option<String>,
    pub capacity: Option<u32>,
    pub num_bikes_available: Option<u32>,
    pub num_docks_available: Option<u32>,
    /// Unix seconds of the station's last report.
    pub last_reported: Option<i64>,
    pub is_renting: Option<bool>,
}

impl MergedStation {
    /// Available bikes, with an unreported count treated as zero.
    pub fn bikes(&self) -> u32 {
        self.num_bikes_available.unwrap_or(0)
    }
}

/// An immutable, fully-joined view of the network at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    stations: Vec<MergedStation>,
    captured_at: DateTime<Utc>,
    fetched_at: Instant,
}

impl Snapshot {
    /// Create a snapshot.
    ///
    /// `captured_at` is the wall-clock capture time reported to clients;
    /// `fetched_at` is the monotonic instant used for TTL checks.
    pub fn new(stations: Vec<MergedStation>, captured_at: DateTime<Utc>, fetched_at: Instant) -> Self {
        Self {
            stations,
            captured_at,
            fetched_at,
        }
    }

    /// Stations in status-feed order.
    pub fn stations(&self) -> &[MergedStation] {
        &self.stations
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Time since this snapshot was fetched.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// Whether this snapshot may still be served without a refresh.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Look up a station by id.
    pub fn get(&self, station_id: &str) -> Option<&MergedStation> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }

    /// Stations with at least `min_bikes` available, in snapshot order.
    pub fn with_min_bikes(&self, min_bikes: u64) -> Vec<MergedStation> {
        self.stations
            .iter()
            .filter(|s| u64::from(s.bikes()) >= min_bikes)
            .cloned()
            .collect()
    }
}

/// Clamp a client-supplied threshold into the valid range.
///
/// Negative thresholds are treated as zero rather than rejected. The result
/// is wider than any bike count, so thresholds above `u32::MAX` match nothing.
pub fn clamp_min_bikes(min_bikes: i64) -> u64 {
    min_bikes.max(0).unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, bikes: Option<u32>) -> MergedStation {
        MergedStation {
            station_id: id.to_string(),
            name: None,
            lat: None,
            lon: None,
            address: None,
            capacity: None,
            num_bikes_available: bikes,
            num_docks_available: Some(1),
            last_reported: None,
            is_renting: None,
        }
    }

    fn snapshot(stations: Vec<MergedStation>) -> Snapshot {
        Snapshot::new(stations, Utc::now(), Instant::now())
    }

    #[test]
    fn clamp_negative_and_huge_thresholds() {
        assert_eq!(clamp_min_bikes(-5), 0);
        assert_eq!(clamp_min_bikes(0), 0);
        assert_eq!(clamp_min_bikes(7), 7);
        assert_eq!(clamp_min_bikes(i64::MAX), i64::MAX as u64);
    }

    #[test]
    fn threshold_above_any_count_matches_nothing() {
        let snap = snapshot(vec![station("A", Some(u32::MAX)), station("B", Some(3))]);

        assert_eq!(snap.with_min_bikes(u64::from(u32::MAX)).len(), 1);
        assert!(snap.with_min_bikes(clamp_min_bikes(i64::MAX)).is_empty());
    }

    #[test]
    fn unreported_bike_count_counts_as_zero() {
        let snap = snapshot(vec![station("A", None), station("B", Some(2))]);

        let all: Vec<_> = snap.with_min_bikes(0).into_iter().map(|s| s.station_id).collect();
        let some: Vec<_> = snap.with_min_bikes(1).into_iter().map(|s| s.station_id).collect();

        assert_eq!(all, ["A", "B"]);
        assert_eq!(some, ["B"]);
    }

    #[test]
    fn filtering_keeps_order_and_leaves_snapshot_untouched() {
        let snap = snapshot(vec![
            station("C", Some(3)),
            station("A", Some(0)),
            station("B", Some(9)),
        ]);

        let ids: Vec<_> = snap.with_min_bikes(3).into_iter().map(|s| s.station_id).collect();

        assert_eq!(ids, ["C", "B"]);
        assert_eq!(snap.len(), 3);
    }

    #[test]
    fn lookup_by_id() {
        let snap = snapshot(vec![station("A", Some(1)), station("B", Some(2))]);

        assert_eq!(snap.get("B").and_then(|s| s.num_bikes_available), Some(2));
        assert!(snap.get("Z").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn freshness_follows_ttl() {
        let snap = snapshot(vec![]);
        let ttl = Duration::from_secs(60);

        assert!(snap.is_fresh(Instant::now(), ttl));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(snap.is_fresh(Instant::now(), ttl));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!snap.is_fresh(Instant::now(), ttl));
        assert_eq!(snap.age(Instant::now()), ttl);
    }
}
