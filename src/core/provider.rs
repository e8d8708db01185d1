//! Provider request descriptors and the fetch abstraction

use crate::core::category::ProviderId;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Everything needed to issue one provider request. Query values are kept
/// unencoded; the HTTP client encodes them when sending.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub provider: ProviderId,
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
}

// Hand-written so API keys never reach the logs.
impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let query_names: Vec<&str> = self.query.iter().map(|(name, _)| *name).collect();
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| *name).collect();
        f.debug_struct("ProviderDescriptor")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("query", &query_names)
            .field("headers", &header_names)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {provider} timed out")]
    Timeout { provider: ProviderId },

    #[error("Request to {provider} failed: {message}")]
    Transport { provider: ProviderId, message: String },

    #[error("{provider} responded with HTTP {status}")]
    Status { provider: ProviderId, status: u16 },

    #[error("Failed to parse {provider} response: {message}")]
    Decode { provider: ProviderId, message: String },

    #[error("{provider} response is not a JSON object")]
    NotAnObject { provider: ProviderId },
}

#[async_trait]
pub trait MetricFetcher: Send + Sync {
    /// Issues the request and returns the decoded JSON object.
    async fn fetch(&self, descriptor: &ProviderDescriptor) -> Result<Value, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secrets() {
        let descriptor = ProviderDescriptor {
            provider: ProviderId::Whois,
            url: "https://api.example.com/whois/query".to_string(),
            query: vec![
                ("domain", "a.com".to_string()),
                ("token", "s3cret".to_string()),
            ],
            headers: vec![("apikey", "s3cret".to_string())],
        };

        let debug = format!("{descriptor:?}");
        assert!(!debug.contains("s3cret"), "{debug}");
        assert!(debug.contains("https://api.example.com/whois/query"));
        assert!(debug.contains("token"));
        assert!(debug.contains("apikey"));
    }
}
