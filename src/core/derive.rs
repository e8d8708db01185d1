//! Turns raw provider payloads into presentation-ready values.
//!
//! Every function here is pure. A missing or malformed source field never
//! fails an aggregation; the affected field becomes [`FieldValue::Unavailable`].

use crate::core::category::{MetricCategory, fields};
use crate::core::error::DerivationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

pub const NOT_AVAILABLE: &str = "Not Available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Count(u64),
    Age(DomainAge),
    Chain(Vec<String>),
    Unavailable,
}

impl FieldValue {
    pub fn is_available(&self) -> bool {
        !matches!(self, FieldValue::Unavailable)
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Count(n) => f.write_str(&format_count(*n)),
            FieldValue::Age(age) => write!(f, "{age}"),
            FieldValue::Chain(domains) => f.write_str(&domains.join(", ")),
            FieldValue::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Calendar-naive age: a year is 365 days and a month is 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainAge {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub total_days: i64,
}

impl Display for DomainAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Years {} Months {} Days",
            self.years, self.months, self.days
        )
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats an integer with thousands separators: `1234567` -> `"1,234,567"`.
pub fn format_count(n: u64) -> String {
    group_digits(&n.to_string())
}

/// Rounds a numeric string to a whole amount and groups it: `"12345.6"` -> `"12,346"`.
pub fn format_currency(raw: &str) -> Result<String, DerivationError> {
    let amount = Decimal::from_str(raw.trim()).map_err(|_| DerivationError::Unparsable {
        field: "govalue",
        value: raw.to_string(),
    })?;
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = group_digits(&rounded.abs().trunc().to_string());

    if rounded.is_sign_negative() && !rounded.is_zero() {
        Ok(format!("-{digits}"))
    } else {
        Ok(digits)
    }
}

/// Parses the loosely ISO formatted dates WHOIS providers return.
pub fn parse_provider_date(
    field: &'static str,
    raw: &str,
) -> Result<DateTime<Utc>, DerivationError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DerivationError::Unparsable {
            field,
            value: raw.to_string(),
        })
}

/// Formats a provider date as `"Month D, YYYY"`.
pub fn format_date(raw: &str) -> Result<String, DerivationError> {
    let date = parse_provider_date("date", raw)?;
    Ok(date.format("%B %-d, %Y").to_string())
}

pub fn domain_age(
    creation: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DomainAge, DerivationError> {
    let total_days = (now - creation).num_days();
    if total_days < 0 {
        return Err(DerivationError::FutureDate(creation.to_rfc3339()));
    }
    let remainder = total_days % 365;
    Ok(DomainAge {
        years: total_days / 365,
        months: remainder / 30,
        days: remainder % 30,
        total_days,
    })
}

pub fn index_label(indexed: Option<bool>) -> &'static str {
    match indexed {
        Some(true) => "Yes",
        Some(false) => "No",
        None => NOT_AVAILABLE,
    }
}

/// Integer-looking scores become counts; anything else is shown verbatim.
fn metric_value(payload: &Value, key: &str) -> FieldValue {
    match payload.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map_or_else(|| FieldValue::Text(n.to_string()), FieldValue::Count),
        Some(Value::String(s)) if !s.trim().is_empty() => {
            let s = s.trim();
            s.parse::<u64>()
                .map_or_else(|_| FieldValue::Text(s.to_string()), FieldValue::Count)
        }
        _ => FieldValue::Unavailable,
    }
}

fn raw_text(value: Option<&Value>, field: &'static str) -> Result<String, DerivationError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(DerivationError::Missing(field)),
    }
}

fn or_unavailable(
    category: MetricCategory,
    field: &'static str,
    value: Result<FieldValue, DerivationError>,
) -> FieldValue {
    value.unwrap_or_else(|e| {
        warn!(%category, field, error = %e, "Derived field unavailable");
        FieldValue::Unavailable
    })
}

/// Extracts and derives every output field of `category` from its provider payload.
pub fn derive_fields(
    category: MetricCategory,
    payload: &Value,
    now: DateTime<Utc>,
) -> Vec<(&'static str, FieldValue)> {
    match category {
        MetricCategory::AuthorityScores => vec![
            (fields::AUTHORITY_SCORE, metric_value(payload, "mozDA")),
            (fields::PAGE_AUTHORITY, metric_value(payload, "mozPA")),
        ],
        MetricCategory::TrustCitationFlow => vec![
            (fields::TRUST_FLOW, metric_value(payload, "majesticTF")),
            (fields::CITATION_FLOW, metric_value(payload, "majesticCF")),
        ],
        MetricCategory::ReferringDomains => vec![(
            fields::REFERRING_DOMAINS,
            metric_value(payload, "majesticRefDomains"),
        )],
        MetricCategory::TotalBacklinks => vec![(
            fields::TOTAL_BACKLINKS,
            metric_value(payload, "majesticLinks"),
        )],
        MetricCategory::EstimatedValue => {
            let value = raw_text(payload.get("govalue"), "govalue")
                .and_then(|raw| format_currency(&raw))
                .map(FieldValue::Text);
            vec![(
                fields::ESTIMATED_VALUE_USD,
                or_unavailable(category, fields::ESTIMATED_VALUE_USD, value),
            )]
        }
        MetricCategory::IndexStatus => {
            let value = match payload.get("isIndexed").and_then(Value::as_bool) {
                Some(indexed) => FieldValue::Text(index_label(Some(indexed)).to_string()),
                None => FieldValue::Unavailable,
            };
            vec![(fields::IS_INDEXED, value)]
        }
        MetricCategory::DropHistory => {
            let value = payload
                .get("drops")
                .and_then(Value::as_u64)
                .map_or(FieldValue::Unavailable, FieldValue::Count);
            vec![(fields::DROP_COUNT, value)]
        }
        MetricCategory::ExpirationDate => {
            let value = raw_text(
                payload.pointer("/result/expiration_date"),
                "expiration_date",
            )
            .and_then(|raw| format_date(&raw))
            .map(FieldValue::Text);
            vec![(
                fields::EXPIRATION_DATE,
                or_unavailable(category, fields::EXPIRATION_DATE, value),
            )]
        }
        MetricCategory::DomainAge => {
            let age = raw_text(payload.pointer("/result/creation_date"), "creation_date")
                .and_then(|raw| parse_provider_date("creation_date", &raw))
                .and_then(|created| domain_age(created, now));
            match age {
                Ok(age) => vec![
                    (fields::DOMAIN_AGE, FieldValue::Age(age)),
                    (
                        fields::DOMAIN_AGE_DAYS,
                        FieldValue::Count(age.total_days.unsigned_abs()),
                    ),
                ],
                Err(e) => {
                    warn!(%category, error = %e, "Domain age unavailable");
                    vec![
                        (fields::DOMAIN_AGE, FieldValue::Unavailable),
                        (fields::DOMAIN_AGE_DAYS, FieldValue::Unavailable),
                    ]
                }
            }
        }
        MetricCategory::RedirectedDomains => {
            let chain = payload
                .get("domains")
                .and_then(Value::as_array)
                .map_or(FieldValue::Unavailable, |domains| {
                    FieldValue::Chain(
                        domains
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect(),
                    )
                });
            let total = payload
                .get("total")
                .and_then(Value::as_u64)
                .map_or(FieldValue::Unavailable, FieldValue::Count);
            vec![(fields::REDIRECT_CHAIN, chain), (fields::REDIRECT_TOTAL, total)]
        }
    }
}
