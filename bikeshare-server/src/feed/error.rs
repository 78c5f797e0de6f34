//! Feed client error types.

use std::time::Duration;

/// Errors that can occur while retrieving or interpreting the GBFS feeds.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Discovery document unreachable or unparsable
    #[error("discovery document unavailable: {message}")]
    Discovery { message: String },

    /// A required feed is not listed in the discovery document
    #[error("feed `{name}` not listed in discovery document")]
    FeedNotFound { name: String },

    /// A data feed could not be fetched or parsed
    #[error("failed to fetch `{feed}`: {message}")]
    Fetch { feed: String, message: String },

    /// Refresh exceeded its wall-clock budget
    #[error("refresh timed out after {}s", after.as_secs())]
    Timeout { after: Duration },

    /// Refresh task ended without producing a result
    #[error("refresh aborted: {message}")]
    Aborted { message: String },
}

impl FeedError {
    /// Wrap a lower-level error as a discovery failure.
    pub(crate) fn discovery(err: FeedError) -> Self {
        match err {
            FeedError::Discovery { .. } => err,
            other => FeedError::Discovery {
                message: other.to_string(),
            },
        }
    }

    /// Wrap a lower-level error as a failure of the named feed.
    pub(crate) fn fetch(feed: &str, err: FeedError) -> Self {
        match err {
            FeedError::Fetch { .. } => err,
            other => FeedError::Fetch {
                feed: feed.to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::FeedNotFound {
            name: "station_status".into(),
        };
        assert_eq!(
            err.to_string(),
            "feed `station_status` not listed in discovery document"
        );

        let err = FeedError::Api {
            status: 502,
            message: "Bad Gateway".into(),
        };
        assert_eq!(err.to_string(), "API error 502: Bad Gateway");

        let err = FeedError::Timeout {
            after: Duration::from_secs(15),
        };
        assert_eq!(err.to_string(), "refresh timed out after 15s");
    }

    #[test]
    fn wrapping_keeps_the_cause() {
        let err = FeedError::discovery(FeedError::Api {
            status: 500,
            message: "oops".into(),
        });
        assert!(matches!(err, FeedError::Discovery { .. }));
        assert!(err.to_string().contains("API error 500: oops"));

        let err = FeedError::fetch(
            "station_status",
            FeedError::Json {
                message: "expected value".into(),
            },
        );
        assert_eq!(
            err.to_string(),
            "failed to fetch `station_status`: JSON parse error: expected value"
        );
    }

    #[test]
    fn wrapping_is_not_nested_twice() {
        let inner = FeedError::Fetch {
            feed: "station_information".into(),
            message: "gone".into(),
        };
        let err = FeedError::fetch("station_information", inner);
        assert_eq!(
            err.to_string(),
            "failed to fetch `station_information`: gone"
        );
    }
}
