use crate::core::config::ProvidersConfig;
use crate::core::{DomainKey, MetricCategory, ProviderDescriptor, ProviderId};
use std::collections::HashMap;

struct Endpoint {
    base_url: String,
    api_key: Option<String>,
}

/// Builds the outbound request of every category. Keys are resolved once at
/// construction and never change afterwards.
pub struct ProviderRegistry {
    endpoints: HashMap<ProviderId, Endpoint>,
}

impl ProviderRegistry {
    pub fn new(config: &ProvidersConfig) -> Self {
        let endpoints = ProviderId::ALL
            .iter()
            .map(|provider| {
                let endpoint = Endpoint {
                    base_url: config
                        .endpoint(*provider)
                        .base_url
                        .trim_end_matches('/')
                        .to_string(),
                    api_key: config.api_key(*provider),
                };
                (*provider, endpoint)
            })
            .collect();
        Self { endpoints }
    }

    pub fn describe(&self, category: MetricCategory, domain: &DomainKey) -> ProviderDescriptor {
        self.describe_provider(category.provider(), domain)
    }

    pub fn describe_provider(&self, provider: ProviderId, domain: &DomainKey) -> ProviderDescriptor {
        let (base, key) = self
            .endpoints
            .get(&provider)
            .map_or(("", None), |e| (e.base_url.as_str(), e.api_key.as_deref()));
        let domain = domain.as_str();

        let (url, query, headers) = match provider {
            ProviderId::Links => (
                format!("{base}/api/checkDomain.php"),
                with_key(
                    vec![
                        ("domain", domain.to_string()),
                        ("app", "DomDetailer".to_string()),
                        ("majesticChoice", "root".to_string()),
                    ],
                    "apikey",
                    key,
                ),
                Vec::new(),
            ),
            ProviderId::Appraisal => (
                format!("{base}/v1/appraisal/{domain}"),
                Vec::new(),
                key.map(|k| vec![("Authorization", format!("sso-key {k}"))])
                    .unwrap_or_default(),
            ),
            ProviderId::Index => (
                format!("{base}/is_domain_indexed/{domain}"),
                Vec::new(),
                Vec::new(),
            ),
            ProviderId::DnsHistory => (
                format!("{base}/v2/dns-history/{domain}"),
                with_key(Vec::new(), "key", key),
                Vec::new(),
            ),
            ProviderId::Redirects => (
                format!("{base}/api/domains/redirects/{domain}"),
                with_key(Vec::new(), "token", key),
                Vec::new(),
            ),
            ProviderId::Whois => (
                format!("{base}/whois/query"),
                vec![("domain", domain.to_string())],
                key.map(|k| vec![("apikey", k.to_string())])
                    .unwrap_or_default(),
            ),
        };

        ProviderDescriptor {
            provider,
            url,
            query,
            headers,
        }
    }
}

fn with_key(
    mut query: Vec<(&'static str, String)>,
    name: &'static str,
    key: Option<&str>,
) -> Vec<(&'static str, String)> {
    if let Some(k) = key {
        query.push((name, k.to_string()));
    }
    query
}
