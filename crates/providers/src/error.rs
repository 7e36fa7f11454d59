//! Error types for provider fetches.

use thiserror::Error;

/// Errors that can occur while fetching from one provider.
///
/// All of these are provider-local: the aggregator logs them and treats
/// the provider as having returned zero items for the cycle.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("unusable payload: {0}")]
    Payload(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

impl ProviderError {
    /// True when a retry on the next cycle may succeed without operator
    /// action.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Http(_) | ProviderError::Status(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Status(502).is_transient());
        assert!(!ProviderError::MissingCredentials("BINANCE_API_KEY").is_transient());
        assert!(!ProviderError::Payload("no list".to_string()).is_transient());
    }
}
