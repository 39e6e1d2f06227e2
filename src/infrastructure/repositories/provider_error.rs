/// Failure of a call to an external AI provider.
///
/// The variants drive retry decisions: only [`ProviderError::is_transient`]
/// failures are worth another attempt, and [`ProviderError::is_rejected`]
/// marks input the provider refused (e.g. a prompt that is too large).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,
    #[error("transient failure: {message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("request failed ({status}): {message}")]
    Permanent { status: u16, message: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transient { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            408 | 429 | 500..=599 => Self::Transient {
                status: Some(status),
                message: body,
            },
            400 | 413 => Self::Rejected {
                status,
                message: body,
            },
            _ => Self::Permanent {
                status,
                message: body,
            },
        }
    }

    /// Classify a transport-level failure
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Self::Transient {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        } else {
            Self::InvalidResponse(err.to_string())
        }
    }
}
