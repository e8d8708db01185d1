//! Orchestrates cache lookup, quota, concurrent provider fetches and merging.

use crate::core::cache::CategoryCache;
use crate::core::derive::derive_fields;
use crate::core::domain::is_valid_domain;
use crate::core::quota::QuotaSnapshot;
use crate::core::{
    AggregateResult, AggregationError, DomainKey, FieldValue, MetricCategory, MetricFetcher,
    ProviderId, QuotaError, RateLimiter,
};
use crate::providers::ProviderRegistry;
use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPhase {
    Idle,
    Validating,
    QuotaCheck,
    Fetching,
    Merging,
    Ready,
    ValidationFailed,
    QuotaExceeded,
    QuotaUnavailable,
    FetchFailed,
}

pub struct Aggregator {
    registry: ProviderRegistry,
    fetcher: Arc<dyn MetricFetcher>,
    cache: CategoryCache,
    limiter: RateLimiter,
    validate: fn(&str) -> bool,
    phase: Mutex<AggregationPhase>,
    // Domain of the last successful submission; further calls for it only
    // refine the selection and are not charged against the quota.
    session: Mutex<Option<DomainKey>>,
}

impl Aggregator {
    pub fn new(
        registry: ProviderRegistry,
        fetcher: Arc<dyn MetricFetcher>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            registry,
            fetcher,
            cache: CategoryCache::new(),
            limiter,
            validate: is_valid_domain,
            phase: Mutex::new(AggregationPhase::Idle),
            session: Mutex::new(None),
        }
    }

    /// Replaces the domain syntax gate.
    pub fn with_validator(mut self, validate: fn(&str) -> bool) -> Self {
        self.validate = validate;
        self
    }

    pub async fn phase(&self) -> AggregationPhase {
        *self.phase.lock().await
    }

    async fn enter(&self, phase: AggregationPhase) {
        let mut current = self.phase.lock().await;
        debug!("Aggregation phase {:?} -> {:?}", *current, phase);
        *current = phase;
    }

    /// Remaining quota, for display. Never consumes anything.
    pub async fn quota(&self) -> Result<QuotaSnapshot> {
        self.limiter.snapshot().await
    }

    pub async fn aggregate(
        &self,
        domain: &str,
        categories: &BTreeSet<MetricCategory>,
    ) -> Result<AggregateResult, AggregationError> {
        self.enter(AggregationPhase::Idle).await;
        self.enter(AggregationPhase::Validating).await;
        let raw = domain.trim();
        if !(self.validate)(raw) {
            self.enter(AggregationPhase::ValidationFailed).await;
            return Err(AggregationError::InvalidDomain(raw.to_string()));
        }
        let domain = DomainKey::new(raw);

        let mut session = self.session.lock().await;
        let refining = session.as_ref() == Some(&domain);

        // A denied submission leaves the previous domain's cache and session intact
        if refining {
            debug!("Refining selection for {}, quota not charged", domain);
        } else {
            self.enter(AggregationPhase::QuotaCheck).await;
            match self.limiter.check_and_consume().await {
                Ok(allowed) => info!(
                    domain = %domain,
                    remaining = allowed.remaining,
                    "Aggregation permitted"
                ),
                Err(e) => {
                    self.enter(match e {
                        QuotaError::Exceeded { .. } => AggregationPhase::QuotaExceeded,
                        QuotaError::Store(_) => AggregationPhase::QuotaUnavailable,
                    })
                    .await;
                    return Err(e.into());
                }
            }
            *session = None;
        }

        if self.cache.bind(&domain).await {
            debug!("Switched to {}, dropped cached payloads", domain);
        }
        let missing = self.cache.missing(&domain, categories).await;

        self.enter(AggregationPhase::Fetching).await;
        let fetched = match self.fetch_missing(&domain, &missing).await {
            Ok(fetched) => fetched,
            Err(failed) => {
                self.enter(AggregationPhase::FetchFailed).await;
                return Err(AggregationError::FetchFailed { categories: failed });
            }
        };

        self.enter(AggregationPhase::Merging).await;
        for (provider, payload) in &fetched {
            if let Some(category) = provider.categories().first() {
                self.cache.put(&domain, *category, payload.clone()).await;
            }
        }
        *session = Some(domain.clone());
        drop(session);

        let now = Utc::now();
        let mut fields = BTreeMap::new();
        for category in categories {
            let payload = match fetched.get(&category.provider()) {
                Some(payload) => Some(payload.clone()),
                None => self.cache.get(&domain, *category).await,
            };
            match payload {
                Some(payload) => fields.extend(derive_fields(*category, &payload, now)),
                None => {
                    debug!("No payload for {}/{}", domain, category);
                    for field in category.fields() {
                        fields.insert(*field, FieldValue::Unavailable);
                    }
                }
            }
        }

        self.enter(AggregationPhase::Ready).await;
        Ok(AggregateResult {
            domain,
            categories: categories.iter().copied().collect(),
            fields,
            fetched: fetched.keys().copied().collect(),
        })
    }

    /// Fetches one payload per provider backing `missing`, all at once. Either
    /// every request succeeds or the categories of the failed ones are returned.
    async fn fetch_missing(
        &self,
        domain: &DomainKey,
        missing: &BTreeSet<MetricCategory>,
    ) -> Result<BTreeMap<ProviderId, Value>, Vec<MetricCategory>> {
        let mut groups: BTreeMap<ProviderId, Vec<MetricCategory>> = BTreeMap::new();
        for category in missing {
            groups.entry(category.provider()).or_default().push(*category);
        }
        if groups.is_empty() {
            debug!("All requested categories cached for {}", domain);
            return Ok(BTreeMap::new());
        }

        let fetch_futures = groups.into_iter().map(|(provider, categories)| {
            let descriptor = self.registry.describe_provider(provider, domain);
            async move {
                let result = self.fetcher.fetch(&descriptor).await;
                (provider, categories, result)
            }
        });

        let mut fetched = BTreeMap::new();
        let mut failed = Vec::new();
        for (provider, categories, result) in join_all(fetch_futures).await {
            match result {
                Ok(payload) => {
                    fetched.insert(provider, payload);
                }
                Err(e) => {
                    error!(
                        domain = %domain,
                        %provider,
                        categories = ?categories,
                        error = %e,
                        "Provider fetch failed"
                    );
                    failed.extend(categories);
                }
            }
        }

        if failed.is_empty() {
            Ok(fetched)
        } else {
            Err(failed)
        }
    }
}
