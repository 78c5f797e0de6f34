//! Typed parsing of raw feed payloads.
//!
//! The envelope (`data.stations`) must be well formed or the whole feed is
//! rejected. Individual station records that fail to deserialize are
//! skipped with a warning so that one bad row cannot take the whole
//! network offline.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::error::FeedError;

#[derive(Deserialize)]
struct Envelope {
    data: StationsData,
}

#[derive(Deserialize)]
struct StationsData {
    stations: Vec<Value>,
}

/// Records parsed from one feed, plus how many were dropped.
#[derive(Debug, Clone)]
pub struct ParsedFeed<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

/// Parse the `data.stations` array of a GBFS feed into typed records.
///
/// `feed` is the feed name, used for error and log context.
pub fn parse_stations<T: DeserializeOwned>(
    feed: &str,
    payload: Value,
) -> Result<ParsedFeed<T>, FeedError> {
    let envelope: Envelope = serde_json::from_value(payload).map_err(|e| FeedError::Fetch {
        feed: feed.to_string(),
        message: format!("unexpected payload structure: {e}"),
    })?;

    let mut records = Vec::with_capacity(envelope.data.stations.len());
    let mut skipped = 0;

    for (index, raw) in envelope.data.stations.into_iter().enumerate() {
        match serde_json::from_value::<T>(raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(feed, index, error = %e, "skipping malformed station record");
                skipped += 1;
            }
        }
    }

    Ok(ParsedFeed { records, skipped })
}
