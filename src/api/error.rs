use thiserror::Error;

use crate::subscription::http::QueryError;

pub type ApiResult<T> = Result<T, ApiError>;

/// A failed request, classified by what went wrong.
///
/// The underlying `reqwest` or `serde_json` error is kept as the source.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found: {url}")]
    NotFound {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server error: {url}")]
    Server {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Unexpected {
        status: u16,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("network error: {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response payload from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Classify a non-success response.
    pub(crate) fn from_status(status: u16, url: String, source: reqwest::Error) -> Self {
        match status {
            404 => Self::NotFound { url, source },
            500 => Self::Server { url, source },
            _ => Self::Unexpected {
                status,
                url,
                source,
            },
        }
    }

    /// The HTTP status the server answered with, if it answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Server { .. } => Some(500),
            Self::Unexpected { status, .. } => Some(*status),
            Self::Network { .. } | Self::Decode { .. } | Self::InvalidBaseUrl(_) => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The request URL, when one was built.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::NotFound { url, .. }
            | Self::Server { url, .. }
            | Self::Unexpected { url, .. }
            | Self::Network { url, .. }
            | Self::Decode { url, .. } => Some(url),
            Self::InvalidBaseUrl(_) => None,
        }
    }
}

impl From<ApiError> for QueryError {
    fn from(error: ApiError) -> Self {
        let message = error.to_string();
        match (&error, error.status()) {
            (_, Some(status)) => Self::Status { status, message },
            (ApiError::Network { .. }, None) => Self::NetworkError(message),
            _ => Self::FetchError(message),
        }
    }
}
