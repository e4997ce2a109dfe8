use crate::client::providers::{SourceError, SourceErrorKind};
use thiserror::Error;

/// Crate-level error type
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // I/O errors (potentially transient)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors (usually permanent)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Network errors (transient)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Client errors (permanent)
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    // Errors raised by a search source
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Error categorization for callers deciding whether to try again
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Permanent errors - repeating the call will not help
    Permanent,
    /// Transient errors - safe to retry later
    Transient,
}

impl Error {
    /// Categorize error for retry decisions
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::InvalidInput { .. } | Self::Serde(_) => {
                ErrorCategory::Permanent
            }

            Self::Source(err) => match err.kind() {
                SourceErrorKind::SourceUnavailable => ErrorCategory::Transient,
                SourceErrorKind::SourceProtocolError | SourceErrorKind::SourceNotFound => {
                    ErrorCategory::Permanent
                }
            },

            Self::Http(_) | Self::Io(_) => ErrorCategory::Transient,
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transient)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
