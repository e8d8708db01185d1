use crate::core::category::{MetricCategory, ProviderId};
use crate::core::domain::DomainKey;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Entries {
    domain: Option<DomainKey>,
    // Keyed by provider: one payload answers every category in its group.
    payloads: HashMap<ProviderId, Value>,
}

/// Raw provider payloads for the domain currently being inspected.
///
/// The cache only ever holds entries for one domain. Binding it to another
/// domain drops everything cached for the previous one.
#[derive(Default)]
pub struct CategoryCache {
    inner: RwLock<Entries>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `domain` the current domain, clearing entries of any other one.
    /// Returns true when entries were dropped.
    pub async fn bind(&self, domain: &DomainKey) -> bool {
        let mut entries = self.inner.write().await;
        if entries.domain.as_ref() == Some(domain) {
            return false;
        }
        let dropped = !entries.payloads.is_empty();
        debug!(
            "Cache CLEAR: {:?} -> {}",
            entries.domain.as_ref().map(DomainKey::as_str),
            domain
        );
        entries.payloads.clear();
        entries.domain = Some(domain.clone());
        dropped
    }

    pub async fn get(&self, domain: &DomainKey, category: MetricCategory) -> Option<Value> {
        let entries = self.inner.read().await;
        if entries.domain.as_ref() != Some(domain) {
            debug!("Cache MISS for {}/{}: other domain", domain, category);
            return None;
        }
        let value = entries.payloads.get(&category.provider()).cloned();
        if value.is_some() {
            debug!("Cache HIT for {}/{}", domain, category);
        } else {
            debug!("Cache MISS for {}/{}", domain, category);
        }
        value
    }

    /// Stores the payload backing `category`; every category sharing its
    /// provider becomes available at the same time.
    pub async fn put(&self, domain: &DomainKey, category: MetricCategory, payload: Value) {
        let mut entries = self.inner.write().await;
        if entries.domain.as_ref() != Some(domain) {
            debug!("Cache CLEAR before PUT for {}", domain);
            entries.payloads.clear();
            entries.domain = Some(domain.clone());
        }
        let provider = category.provider();
        debug!("Cache PUT for {}/{}", domain, provider);
        entries.payloads.insert(provider, payload);
    }

    pub async fn missing(
        &self,
        domain: &DomainKey,
        categories: &BTreeSet<MetricCategory>,
    ) -> BTreeSet<MetricCategory> {
        let entries = self.inner.read().await;
        if entries.domain.as_ref() != Some(domain) {
            return categories.clone();
        }
        categories
            .iter()
            .filter(|category| !entries.payloads.contains_key(&category.provider()))
            .copied()
            .collect()
    }
}
