//! GBFS feed retrieval.
//!
//! A GBFS system publishes a root discovery document (`gbfs.json`) listing
//! named sub-feeds. This module fetches that document and the two station
//! feeds we need, and turns raw payloads into typed records:
//! - `station_information`: slow-changing metadata (name, position, address)
//! - `station_status`: live availability (bikes and docks)

mod client;
mod error;
mod mock;
mod parse;
mod source;
mod types;

pub use client::{DEFAULT_DISCOVERY_URL, FeedClient, FeedClientConfig, HttpFeedClient};
pub use error::FeedError;
pub use mock::{MOCK_INFORMATION_URL, MOCK_STATUS_URL, MockFeedClient};
pub use parse::{ParsedFeed, parse_stations};
pub use source::FeedSource;
pub use types::{
    DiscoveryData, DiscoveryDocument, FeedEntry, FeedList, STATION_INFORMATION, STATION_STATUS,
    StationInformation, StationStatus,
};
