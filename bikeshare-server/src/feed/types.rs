//! GBFS payload DTOs.
//!
//! These types map directly to the GBFS JSON documents. Upstream providers
//! vary a lot between GBFS versions (numeric vs string ids, localized names,
//! `0`/`1` vs boolean flags), so the deserializers here are lenient about
//! representation. A record is only rejected when a required field is
//! missing; an unreadable optional field becomes `None`.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::error::FeedError;

/// Name of the station metadata feed in the discovery document.
pub const STATION_INFORMATION: &str = "station_information";

/// Name of the station availability feed in the discovery document.
pub const STATION_STATUS: &str = "station_status";

/// Root `gbfs.json` document.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    pub data: DiscoveryData,
}

/// Feed listing of a discovery document.
///
/// GBFS 1.x/2.x group feeds by language; GBFS 3.x lists them directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DiscoveryData {
    Flat(FeedList),
    ByLanguage(BTreeMap<String, FeedList>),
}

/// List of feeds for one language.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedList {
    pub feeds: Vec<FeedEntry>,
}

/// A named feed and where to fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedEntry {
    pub name: String,
    pub url: String,
}

impl DiscoveryDocument {
    /// Feeds for the given language.
    ///
    /// Falls back to `en`, then to the alphabetically first language, when
    /// the preferred language is not published. Flat (GBFS 3.x) documents
    /// ignore the language.
    pub fn feeds(&self, language: &str) -> &[FeedEntry] {
        match &self.data {
            DiscoveryData::Flat(list) => &list.feeds,
            DiscoveryData::ByLanguage(by_lang) => by_lang
                .get(language)
                .or_else(|| by_lang.get("en"))
                .or_else(|| by_lang.values().next())
                .map(|list| list.feeds.as_slice())
                .unwrap_or_default(),
        }
    }

    /// URL of the feed called exactly `name`.
    pub fn feed_url(&self, language: &str, name: &str) -> Result<&str, FeedError> {
        self.feeds(language)
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.url.as_str())
            .ok_or_else(|| FeedError::FeedNotFound {
                name: name.to_string(),
            })
    }
}

/// One record of `station_information`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationInformation {
    #[serde(deserialize_with = "station_id")]
    pub station_id: String,

    #[serde(deserialize_with = "localized_name")]
    pub name: String,

    pub lat: f64,

    pub lon: f64,

    #[serde(default)]
    pub address: Option<String>,

    /// Number of docks installed at the station.
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// One record of `station_status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationStatus {
    #[serde(deserialize_with = "station_id")]
    pub station_id: String,

    #[serde(default, deserialize_with = "count")]
    pub num_bikes_available: Option<u32>,

    #[serde(default, deserialize_with = "count")]
    pub num_docks_available: Option<u32>,

    /// Unix seconds of the station's last report.
    #[serde(default, deserialize_with = "timestamp")]
    pub last_reported: Option<i64>,

    #[serde(default, deserialize_with = "flag")]
    pub is_renting: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// Station ids are strings in GBFS, but several providers publish integers.
fn station_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) if s.is_empty() => Err(D::Error::custom("empty station_id")),
        StringOrNumber::String(s) => Ok(s),
        StringOrNumber::Number(n) => Ok(n.to_string()),
    }
}

#[derive(Deserialize)]
struct LocalizedString {
    text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedName {
    Plain(String),
    Localized(Vec<LocalizedString>),
}

/// GBFS 3.x publishes names as `[{ "text": .., "language": .. }]`.
fn localized_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match LocalizedName::deserialize(deserializer)? {
        LocalizedName::Plain(s) => Ok(s),
        LocalizedName::Localized(texts) => texts
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| D::Error::custom("empty localized name")),
    }
}

/// Unix seconds (GBFS 1.x/2.x, sometimes fractional) or RFC 3339 (GBFS 3.x).
fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let secs = match &raw {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|t| t.timestamp())
            .ok()
            .or_else(|| s.trim().parse::<i64>().ok()),
        _ => None,
    };

    if secs.is_none() {
        warn!(value = %raw, "ignoring unreadable last_reported");
    }
    Ok(secs)
}

/// Booleans are `true`/`false` in recent GBFS and `1`/`0` in older feeds.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let flag = match &raw {
        Value::Null => return Ok(None),
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };

    if flag.is_none() {
        warn!(value = %raw, "ignoring unreadable flag");
    }
    Ok(flag)
}

/// Non-negative integer counts, also accepted as `5.0` or `"5"`.
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let count = match &raw {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .and_then(|n| u32::try_from(n).ok());

    if count.is_none() {
        warn!(value = %raw, "ignoring unreadable station count");
    }
    Ok(count)
}
