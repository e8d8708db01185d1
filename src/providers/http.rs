use crate::core::{FetchError, MetricFetcher, ProviderDescriptor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Fetches provider payloads over HTTP with a fixed per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("domain-metrics/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetricFetcher for HttpFetcher {
    #[instrument(
        name = "ProviderFetch",
        skip(self, descriptor),
        fields(provider = %descriptor.provider)
    )]
    async fn fetch(&self, descriptor: &ProviderDescriptor) -> Result<Value, FetchError> {
        let provider = descriptor.provider;
        debug!("Requesting {}", descriptor.url);

        let mut request = self.client.get(&descriptor.url).query(&descriptor.query);
        for (name, value) in &descriptor.headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { provider }
            } else {
                FetchError::Transport {
                    provider,
                    message: e.without_url().to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                provider,
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { provider }
            } else {
                FetchError::Transport {
                    provider,
                    message: e.without_url().to_string(),
                }
            }
        })?;

        let payload: Value = match serde_json::from_str(&text) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %text,
                    "Failed to parse provider response"
                );
                return Err(FetchError::Decode {
                    provider,
                    message: e.to_string(),
                });
            }
        };

        if !payload.is_object() {
            return Err(FetchError::NotAnObject { provider });
        }
        debug!("Received {} payload", provider);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProviderId;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(request_path: &str, response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn descriptor(url: String) -> ProviderDescriptor {
        ProviderDescriptor {
            provider: ProviderId::Index,
            url,
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let mock_server = create_mock_server(
            "/is_domain_indexed/example.com",
            ResponseTemplate::new(200).set_body_string(r#"{"isIndexed": true}"#),
        )
        .await;

        let payload = fetcher()
            .fetch(&descriptor(format!(
                "{}/is_domain_indexed/example.com",
                mock_server.uri()
            )))
            .await
            .unwrap();

        assert_eq!(payload["isIndexed"], Value::Bool(true));
    }

    #[tokio::test]
    async fn test_sends_headers_and_encoded_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/whois/query"))
            .and(query_param("domain", "example.com"))
            .and(query_param("token", "a&b#c+d=e"))
            .and(header("apikey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result": {}}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let descriptor = ProviderDescriptor {
            provider: ProviderId::Whois,
            url: format!("{}/whois/query", mock_server.uri()),
            query: vec![
                ("domain", "example.com".to_string()),
                ("token", "a&b#c+d=e".to_string()),
            ],
            headers: vec![("apikey", "secret".to_string())],
        };

        assert!(fetcher().fetch(&descriptor).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mock_server =
            create_mock_server("/is_domain_indexed/example.com", ResponseTemplate::new(503)).await;

        let err = fetcher()
            .fetch(&descriptor(format!(
                "{}/is_domain_indexed/example.com",
                mock_server.uri()
            )))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503, .. }), "{err}");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let mock_server = create_mock_server(
            "/is_domain_indexed/example.com",
            ResponseTemplate::new(200).set_body_string("<html>oops</html>"),
        )
        .await;

        let err = fetcher()
            .fetch(&descriptor(format!(
                "{}/is_domain_indexed/example.com",
                mock_server.uri()
            )))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_non_object_json() {
        let mock_server = create_mock_server(
            "/is_domain_indexed/example.com",
            ResponseTemplate::new(200).set_body_string("[1, 2, 3]"),
        )
        .await;

        let err = fetcher()
            .fetch(&descriptor(format!(
                "{}/is_domain_indexed/example.com",
                mock_server.uri()
            )))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NotAnObject { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_timeout_is_a_fetch_failure() {
        let mock_server = create_mock_server(
            "/is_domain_indexed/example.com",
            ResponseTemplate::new(200)
                .set_body_string(r#"{"isIndexed": true}"#)
                .set_delay(Duration::from_millis(500)),
        )
        .await;

        let fetcher = HttpFetcher::new(Duration::from_millis(50)).unwrap();
        let err = fetcher
            .fetch(&descriptor(format!(
                "{}/is_domain_indexed/example.com",
                mock_server.uri()
            )))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout { .. }), "{err}");
    }
}
