use crate::models::{Game, Resource};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during source operations
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The source could not be reached (DNS, connect, transport timeout)
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with a non-success status or an unusable payload
    #[error("Protocol error{}: {message}", status_suffix(.status))]
    Protocol {
        status: Option<u16>,
        message: String,
    },

    /// No registered source carries this name
    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Source timed out after {0:?}")]
    Timeout(Duration),

    #[error("Search cancelled")]
    Cancelled,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Coarse classification of a [`SourceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    SourceUnavailable,
    SourceProtocolError,
    SourceNotFound,
}

impl SourceError {
    /// Protocol failure without an HTTP status (e.g. a malformed body)
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Protocol {
            status: None,
            message: message.into(),
        }
    }

    /// Protocol failure caused by a non-success HTTP status
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            status: Some(status),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SourceErrorKind {
        match self {
            Self::Unavailable(_) | Self::Timeout(_) | Self::Cancelled => {
                SourceErrorKind::SourceUnavailable
            }
            Self::Protocol { .. } => SourceErrorKind::SourceProtocolError,
            Self::NotFound(_) => SourceErrorKind::SourceNotFound,
        }
    }

    /// Map a reqwest failure raised while sending a request or reading its body
    pub(crate) fn from_transport(source: &str, err: &reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(format!("{source}: failed to read response: {err}"))
        } else if err.is_timeout() {
            Self::Unavailable(format!("{source}: request timed out: {err}"))
        } else if err.is_connect() {
            Self::Unavailable(format!("{source}: connection failed: {err}"))
        } else {
            Self::Unavailable(format!("{source}: request failed: {err}"))
        }
    }
}

/// A remote catalogue that can be searched for games and asked for their resources.
///
/// Implementations must be stateless apart from their HTTP client so the
/// aggregator can call them concurrently.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Unique name, also stamped on every [`Game`] this source produces
    fn name(&self) -> &str;

    /// Human-readable description of the source
    fn description(&self) -> &str {
        ""
    }

    /// Run one remote query for `keyword`
    async fn search(&self, keyword: &str) -> Result<Vec<Game>, SourceError>;

    /// List the resources for a game id previously returned by [`Self::search`]
    async fn resolve(&self, id: &str) -> Result<Vec<Resource>, SourceError>;
}
