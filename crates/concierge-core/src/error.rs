use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConciergeError>;

#[derive(Debug, Error)]
pub enum ConciergeError {
    #[error("API timeout - please try again later")]
    UpstreamTimeout,

    #[error("Unable to connect to member data API: {0}")]
    UpstreamUnavailable(String),

    #[error("Failed to fetch member data: {0}")]
    Upstream(String),

    #[error("AI service not configured. Please set OPENAI_API_KEY environment variable.")]
    NotConfigured,

    #[error("AI service authentication failed")]
    Auth,

    #[error("AI service rate limit exceeded")]
    RateLimited,

    #[error("AI service timeout - please try again later")]
    CompletionTimeout,

    #[error("{0}")]
    Completion(String),

    #[error("{0}")]
    BadInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConciergeError {
    /// Whether a caller may reasonably retry the same request later.
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout
                | Self::UpstreamUnavailable(_)
                | Self::RateLimited
                | Self::CompletionTimeout
        )
    }

    /// Stable machine-readable code for logs and API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UpstreamTimeout => "upstream_timeout",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::Upstream(_) => "upstream_error",
            Self::NotConfigured => "not_configured",
            Self::Auth => "auth_error",
            Self::RateLimited => "rate_limited",
            Self::CompletionTimeout => "completion_timeout",
            Self::Completion(_) => "completion_error",
            Self::BadInput(_) => "bad_input",
            Self::Validation(_) => "validation_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ConciergeError::UpstreamTimeout.is_retryable());
        assert!(ConciergeError::RateLimited.is_retryable());
        assert!(ConciergeError::UpstreamUnavailable("dns".into()).is_retryable());
        assert!(!ConciergeError::Auth.is_retryable());
        assert!(!ConciergeError::NotConfigured.is_retryable());
        assert!(!ConciergeError::BadInput("empty".into()).is_retryable());
    }

    #[test]
    fn test_display_is_short() {
        let err = ConciergeError::Upstream("HTTP 503".into());
        assert_eq!(err.to_string(), "Failed to fetch member data: HTTP 503");
        assert_eq!(err.code(), "upstream_error");
    }
}
