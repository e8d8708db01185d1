//! Error taxonomy of the aggregation core

use crate::core::category::MetricCategory;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuotaError {
    #[error(
        "Request limit reached: you can check up to {max_requests} domains every {window_hours} hours (next reset at {resets_at})"
    )]
    Exceeded {
        max_requests: u32,
        window_hours: i64,
        resets_at: DateTime<Utc>,
    },

    #[error("Quota store error: {0}")]
    Store(String),
}

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    #[error(
        "Request limit reached: you can check up to {max_requests} domains every {window_hours} hours (next reset at {resets_at})"
    )]
    QuotaExceeded {
        max_requests: u32,
        window_hours: i64,
        resets_at: DateTime<Utc>,
    },

    /// One or more provider calls failed; nothing from this attempt was cached.
    #[error("An error occurred while fetching data. Please try again.")]
    FetchFailed { categories: Vec<MetricCategory> },

    #[error("Quota store error: {0}")]
    QuotaStore(String),
}

impl From<QuotaError> for AggregationError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::Exceeded {
                max_requests,
                window_hours,
                resets_at,
            } => AggregationError::QuotaExceeded {
                max_requests,
                window_hours,
                resets_at,
            },
            QuotaError::Store(msg) => AggregationError::QuotaStore(msg),
        }
    }
}

/// A raw provider field could not be turned into a derived value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("Field `{0}` is missing")]
    Missing(&'static str),

    #[error("Field `{field}` has unparsable value `{value}`")]
    Unparsable { field: &'static str, value: String },

    #[error("Date `{0}` lies in the future")]
    FutureDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_quota_message_states_cap() {
        let err: AggregationError = QuotaError::Exceeded {
            max_requests: 10,
            window_hours: 24,
            resets_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
        }
        .into();

        let msg = err.to_string();
        assert!(msg.contains("up to 10 domains every 24 hours"), "{msg}");
        assert!(matches!(err, AggregationError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_fetch_failed_message_is_generic() {
        let err = AggregationError::FetchFailed {
            categories: vec![MetricCategory::DomainAge],
        };
        assert_eq!(
            err.to_string(),
            "An error occurred while fetching data. Please try again."
        );
    }
}
