//! Core business logic abstractions

pub mod cache;
pub mod category;
pub mod config;
pub mod derive;
pub mod domain;
pub mod error;
pub mod log;
pub mod provider;
pub mod quota;
pub mod result;

// Re-export main types for cleaner imports
pub use category::{MetricCategory, ProviderId};
pub use derive::FieldValue;
pub use domain::DomainKey;
pub use error::{AggregationError, QuotaError};
pub use provider::{FetchError, MetricFetcher, ProviderDescriptor};
pub use quota::{QuotaPolicy, QuotaStore, RateLimiter};
pub use result::AggregateResult;
