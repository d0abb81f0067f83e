use thiserror::Error;

/// Everything that can go wrong while asking the backend for insights.
/// Nothing here is retried; each variant becomes one user-visible message.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("AI API key is not configured")]
    NotConfigured,

    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("AI credits depleted. Please add credits to continue.")]
    QuotaExhausted,

    #[error("AI API error: {0}")]
    Upstream(u16),

    #[error("No insights generated")]
    NoInsights,

    #[error("Malformed insight payload: {0}")]
    Malformed(String),

    #[error("Failed to generate insights")]
    Transport(#[source] reqwest::Error),
}

impl InsightError {
    /// HTTP status the daemon answers with. Rate-limit and quota failures keep
    /// their upstream status so clients can tell them apart.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::QuotaExhausted => 402,
            _ => 500,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::QuotaExhausted)
    }
}
