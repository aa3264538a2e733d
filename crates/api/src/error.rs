//! Error taxonomy for backend gateway calls.

use thiserror::Error;

/// Errors surfaced by gateway implementations.
///
/// `NotFound` and `Unauthorized` are terminal for the caller's flow;
/// everything else is a network or server failure with no automatic
/// retry at this layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// Map an HTTP response status to the gateway taxonomy.
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        use reqwest::StatusCode;
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            other => Self::HttpStatus(other),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
