//! Error types shared across the janitor crates.

use thiserror::Error;

/// Result type alias for janitor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for retention and store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote store call failed (transport, authentication, or a
    /// non-success status from the server).
    #[error("remote store error: {message}")]
    Remote {
        /// Description of the failure.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An item path could not be split into a logical path and a
    /// version segment.
    #[error("malformed item path: {path:?}")]
    MalformedPath {
        /// The offending path.
        path: String,
    },

    /// A timestamp returned by the store could not be parsed.
    #[error("malformed timestamp {value:?}: {message}")]
    MalformedTimestamp {
        /// The raw timestamp value.
        value: String,
        /// Parser diagnostic.
        message: String,
    },

    /// Invalid operator-supplied configuration.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of what is wrong.
        message: String,
    },
}

impl Error {
    /// Creates a remote error with a message and no underlying cause.
    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a remote error wrapping an underlying cause.
    #[must_use]
    pub fn remote_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Remote {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a malformed-path error.
    #[must_use]
    pub fn malformed_path(path: impl Into<String>) -> Self {
        Self::MalformedPath { path: path.into() }
    }

    /// Creates a malformed-timestamp error.
    #[must_use]
    pub fn malformed_timestamp(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns true if this error came from the remote store.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display_includes_message() {
        let err = Error::remote("connection refused");
        assert_eq!(err.to_string(), "remote store error: connection refused");
        assert!(err.is_remote());
    }

    #[test]
    fn remote_error_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = Error::remote_with_source("search failed", io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn configuration_error_is_not_remote() {
        let err = Error::configuration("bad retention module");
        assert!(!err.is_remote());
        assert_eq!(
            err.to_string(),
            "configuration error: bad retention module"
        );
    }
}
