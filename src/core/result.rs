use crate::core::category::{MetricCategory, ProviderId};
use crate::core::derive::FieldValue;
use crate::core::domain::DomainKey;
use serde::Serialize;
use std::collections::BTreeMap;

/// Merged metrics of one aggregation, keyed by output field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub domain: DomainKey,
    pub categories: Vec<MetricCategory>,
    pub fields: BTreeMap<&'static str, FieldValue>,
    /// Providers contacted by this call; empty when everything came from cache.
    pub fetched: Vec<ProviderId>,
}

impl AggregateResult {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Values of the fields of `category`, in declaration order.
    pub fn values_for(&self, category: MetricCategory) -> Vec<&FieldValue> {
        category
            .fields()
            .iter()
            .filter_map(|field| self.fields.get(field))
            .collect()
    }
}
