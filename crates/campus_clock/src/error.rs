//! Error types for feed loading and configuration.

use thiserror::Error;

/// Errors that can occur while loading one of the feeds.
///
/// Any of these is fatal for the tracker that owns the feed. Anomalies inside
/// a feed (a calendar entry without a location, an exam record with a bad
/// shape) are never reported through this type; they are dropped and counted.
#[derive(Debug, Error, Clone)]
pub enum FeedError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Server answered with a non-success status
    #[error("Feed request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Local feed file could not be read
    #[error("I/O error: {message}")]
    Io { message: String },

    /// The document as a whole could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The configured source is neither a usable URL nor a path
    #[error("Invalid feed source: {source_str}")]
    InvalidSource { source_str: String },
}

impl FeedError {
    /// Returns true if the failure happened while transferring the feed,
    /// as opposed to decoding it.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FeedError::Network { .. } | FeedError::HttpStatus { .. } | FeedError::Io { .. }
        )
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Network {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        FeedError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode {
            message: err.to_string(),
        }
    }
}

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown timezone: {name}")]
    InvalidTimezone { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(FeedError::Network {
            message: "refused".to_string()
        }
        .is_transport());
        assert!(FeedError::HttpStatus {
            url: "http://x".to_string(),
            status: 404
        }
        .is_transport());
        assert!(!FeedError::Decode {
            message: "eof".to_string()
        }
        .is_transport());
    }

    #[test]
    fn test_json_error_becomes_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(FeedError::from(err), FeedError::Decode { .. }));
    }
}
