/// Movie metadata provider abstraction
///
/// A provider answers one question: what does the outside world know about this
/// catalog item right now. Providers report failures as [`ProviderError`]; turning
/// those into placeholder data is the enricher's job, not theirs.
use thiserror::Error;

use crate::models::{ItemId, MovieDetails, UnavailableReason};

pub mod cached;
pub mod tmdb;

/// Failure modes of a single provider call
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn reason(&self) -> UnavailableReason {
        match self {
            ProviderError::Timeout => UnavailableReason::Timeout,
            ProviderError::Transport(_) => UnavailableReason::Transport,
            ProviderError::Status(_) => UnavailableReason::UpstreamStatus,
            ProviderError::Malformed(_) => UnavailableReason::MalformedPayload,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Status(status.as_u16())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Trait for movie metadata providers
///
/// Implementations make exactly one attempt per call and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch details for a single catalog item
    async fn fetch_details(&self, id: &ItemId) -> Result<MovieDetails, ProviderError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
