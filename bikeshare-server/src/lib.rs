//! Bike-share availability server.
//!
//! Mirrors a public GBFS feed: joins live station status with station
//! metadata, caches the merged view for a short TTL, and serves filtered
//! queries over HTTP.

pub mod config;
pub mod feed;
pub mod snapshot;
pub mod web;
