use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `pulse-data`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("failed to parse {entity}: {reason}")]
    Parse { entity: String, reason: String },

    #[error("empty response from {0}")]
    EmptyResponse(String),

    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl DataError {
    /// Determine if the failure is likely to clear up on the next refresh cycle.
    ///
    /// Network failures, rate limits (418/429) and server errors are transient. Parse
    /// failures and other client errors need a code or configuration change.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::Http(_) => true,
            DataError::Status { status, .. } => matches!(status, 418 | 429 | 500..=599),
            DataError::EmptyResponse(_) => true,
            _ => false,
        }
    }

    pub(crate) fn parse(entity: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            entity: entity.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                endpoint: value
                    .url()
                    .map(|url| url.path().to_string())
                    .unwrap_or_default(),
            },
            None => Self::Http(value.to_string()),
        }
    }
}

impl From<url::ParseError> for DataError {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidUrl(value.to_string())
    }
}
