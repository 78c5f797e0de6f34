//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::feed::{DEFAULT_DISCOVERY_URL, FeedClientConfig};
use crate::snapshot::CacheConfig;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Upstream GBFS client settings
    pub feed: FeedClientConfig,

    /// Snapshot cache settings
    pub cache: CacheConfig,

    /// Serve fixtures from this directory instead of the live feed
    pub mock_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable               | Default                     |
    /// |------------------------|-----------------------------|
    /// | `GBFS_URL`             | Ilévia V'Lille `gbfs.json`  |
    /// | `GBFS_LANGUAGE`        | `fr`                        |
    /// | `GBFS_MOCK_DIR`        | unset                       |
    /// | `BIND_ADDR`            | `127.0.0.1:3000`            |
    /// | `CACHE_TTL_SECS`       | `60`                        |
    /// | `REFRESH_TIMEOUT_SECS` | `15`                        |
    /// | `HTTP_TIMEOUT_SECS`    | `10`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from an arbitrary key/value source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_opt::<SocketAddr>(get("BIND_ADDR"), "BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        let mut feed =
            FeedClientConfig::new(get("GBFS_URL").unwrap_or_else(|| DEFAULT_DISCOVERY_URL.into()));
        if let Some(secs) = parse_opt::<u64>(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS")? {
            feed = feed.with_timeout(secs);
        }

        let mut cache = CacheConfig::default();
        if let Some(language) = get("GBFS_LANGUAGE") {
            cache = cache.with_language(language);
        }
        if let Some(secs) = parse_opt::<u64>(get("CACHE_TTL_SECS"), "CACHE_TTL_SECS")? {
            cache = cache.with_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_opt::<u64>(get("REFRESH_TIMEOUT_SECS"), "REFRESH_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: "REFRESH_TIMEOUT_SECS",
                    value: secs.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            cache = cache.with_refresh_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            bind_addr,
            feed,
            cache,
            mock_dir: get("GBFS_MOCK_DIR").map(PathBuf::from),
        })
    }
}

fn parse_opt<T>(value: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                value: v.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
