//! Metric categories, the providers backing them and the result field names

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Output field names of an aggregate result.
pub mod fields {
    pub const AUTHORITY_SCORE: &str = "authorityScore";
    pub const PAGE_AUTHORITY: &str = "pageAuthority";
    pub const TRUST_FLOW: &str = "trustFlow";
    pub const CITATION_FLOW: &str = "citationFlow";
    pub const REFERRING_DOMAINS: &str = "referringDomains";
    pub const TOTAL_BACKLINKS: &str = "totalBacklinks";
    pub const ESTIMATED_VALUE_USD: &str = "estimatedValueUsd";
    pub const IS_INDEXED: &str = "isIndexed";
    pub const DROP_COUNT: &str = "dropCount";
    pub const EXPIRATION_DATE: &str = "expirationDate";
    pub const DOMAIN_AGE: &str = "domainAge";
    pub const DOMAIN_AGE_DAYS: &str = "domainAgeDays";
    pub const REDIRECT_CHAIN: &str = "redirectChain";
    pub const REDIRECT_TOTAL: &str = "redirectTotal";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum MetricCategory {
    AuthorityScores,
    TrustCitationFlow,
    ReferringDomains,
    TotalBacklinks,
    EstimatedValue,
    IndexStatus,
    DropHistory,
    ExpirationDate,
    DomainAge,
    RedirectedDomains,
}

impl MetricCategory {
    /// Every category in display order.
    pub const ALL: [MetricCategory; 10] = [
        MetricCategory::AuthorityScores,
        MetricCategory::TrustCitationFlow,
        MetricCategory::ReferringDomains,
        MetricCategory::TotalBacklinks,
        MetricCategory::EstimatedValue,
        MetricCategory::IndexStatus,
        MetricCategory::DropHistory,
        MetricCategory::ExpirationDate,
        MetricCategory::DomainAge,
        MetricCategory::RedirectedDomains,
    ];

    /// Human readable label used in tables.
    pub fn label(&self) -> &'static str {
        match self {
            MetricCategory::AuthorityScores => "DA & PA",
            MetricCategory::TrustCitationFlow => "TF & CF",
            MetricCategory::ReferringDomains => "Referring Domains",
            MetricCategory::TotalBacklinks => "Total Backlinks",
            MetricCategory::EstimatedValue => "Estimated Value",
            MetricCategory::IndexStatus => "Google Indexed",
            MetricCategory::DropHistory => "Domain Drops",
            MetricCategory::ExpirationDate => "Expiration Date",
            MetricCategory::DomainAge => "Domain Age",
            MetricCategory::RedirectedDomains => "Redirected Domains",
        }
    }

    /// Result fields produced for this category.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            MetricCategory::AuthorityScores => &[fields::AUTHORITY_SCORE, fields::PAGE_AUTHORITY],
            MetricCategory::TrustCitationFlow => &[fields::TRUST_FLOW, fields::CITATION_FLOW],
            MetricCategory::ReferringDomains => &[fields::REFERRING_DOMAINS],
            MetricCategory::TotalBacklinks => &[fields::TOTAL_BACKLINKS],
            MetricCategory::EstimatedValue => &[fields::ESTIMATED_VALUE_USD],
            MetricCategory::IndexStatus => &[fields::IS_INDEXED],
            MetricCategory::DropHistory => &[fields::DROP_COUNT],
            MetricCategory::ExpirationDate => &[fields::EXPIRATION_DATE],
            MetricCategory::DomainAge => &[fields::DOMAIN_AGE, fields::DOMAIN_AGE_DAYS],
            MetricCategory::RedirectedDomains => &[fields::REDIRECT_CHAIN, fields::REDIRECT_TOTAL],
        }
    }

    /// Provider whose response backs this category.
    pub fn provider(&self) -> ProviderId {
        match self {
            MetricCategory::AuthorityScores
            | MetricCategory::TrustCitationFlow
            | MetricCategory::ReferringDomains
            | MetricCategory::TotalBacklinks => ProviderId::Links,
            MetricCategory::EstimatedValue => ProviderId::Appraisal,
            MetricCategory::IndexStatus => ProviderId::Index,
            MetricCategory::DropHistory => ProviderId::DnsHistory,
            MetricCategory::ExpirationDate | MetricCategory::DomainAge => ProviderId::Whois,
            MetricCategory::RedirectedDomains => ProviderId::Redirects,
        }
    }
}

impl Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MetricCategory::AuthorityScores => "authority-scores",
                MetricCategory::TrustCitationFlow => "trust-citation-flow",
                MetricCategory::ReferringDomains => "referring-domains",
                MetricCategory::TotalBacklinks => "total-backlinks",
                MetricCategory::EstimatedValue => "estimated-value",
                MetricCategory::IndexStatus => "index-status",
                MetricCategory::DropHistory => "drop-history",
                MetricCategory::ExpirationDate => "expiration-date",
                MetricCategory::DomainAge => "domain-age",
                MetricCategory::RedirectedDomains => "redirected-domains",
            }
        )
    }
}

impl FromStr for MetricCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "authority-scores" | "authority" | "da" => Ok(MetricCategory::AuthorityScores),
            "trust-citation-flow" | "trust" | "tf" => Ok(MetricCategory::TrustCitationFlow),
            "referring-domains" | "refdomains" => Ok(MetricCategory::ReferringDomains),
            "total-backlinks" | "backlinks" => Ok(MetricCategory::TotalBacklinks),
            "estimated-value" | "value" => Ok(MetricCategory::EstimatedValue),
            "index-status" | "indexed" => Ok(MetricCategory::IndexStatus),
            "drop-history" | "drops" => Ok(MetricCategory::DropHistory),
            "expiration-date" | "expiration" => Ok(MetricCategory::ExpirationDate),
            "domain-age" | "age" => Ok(MetricCategory::DomainAge),
            "redirected-domains" | "redirects" => Ok(MetricCategory::RedirectedDomains),
            _ => Err(anyhow!("Invalid metric category: {}", s)),
        }
    }
}

/// Identity of an upstream HTTP provider. One provider may back several categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ProviderId {
    Links,
    Appraisal,
    Index,
    DnsHistory,
    Redirects,
    Whois,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::Links,
        ProviderId::Appraisal,
        ProviderId::Index,
        ProviderId::DnsHistory,
        ProviderId::Redirects,
        ProviderId::Whois,
    ];

    /// Categories satisfied by a single response of this provider.
    pub fn categories(&self) -> &'static [MetricCategory] {
        match self {
            ProviderId::Links => &[
                MetricCategory::AuthorityScores,
                MetricCategory::TrustCitationFlow,
                MetricCategory::ReferringDomains,
                MetricCategory::TotalBacklinks,
            ],
            ProviderId::Appraisal => &[MetricCategory::EstimatedValue],
            ProviderId::Index => &[MetricCategory::IndexStatus],
            ProviderId::DnsHistory => &[MetricCategory::DropHistory],
            ProviderId::Redirects => &[MetricCategory::RedirectedDomains],
            ProviderId::Whois => &[MetricCategory::ExpirationDate, MetricCategory::DomainAge],
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProviderId::Links => "links",
                ProviderId::Appraisal => "appraisal",
                ProviderId::Index => "index",
                ProviderId::DnsHistory => "dns_history",
                ProviderId::Redirects => "redirects",
                ProviderId::Whois => "whois",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_display() {
        for category in MetricCategory::ALL {
            let parsed: MetricCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!(
            "DA".parse::<MetricCategory>().unwrap(),
            MetricCategory::AuthorityScores
        );
        assert_eq!(
            "domain_age".parse::<MetricCategory>().unwrap(),
            MetricCategory::DomainAge
        );
        assert!("pagerank".parse::<MetricCategory>().is_err());
    }

    #[test]
    fn test_provider_groups_agree_with_category_mapping() {
        for provider in ProviderId::ALL {
            for category in provider.categories() {
                assert_eq!(category.provider(), provider, "{category}");
            }
        }
        let grouped: usize = ProviderId::ALL.iter().map(|p| p.categories().len()).sum();
        assert_eq!(grouped, MetricCategory::ALL.len());
    }

    #[test]
    fn test_every_category_has_fields() {
        for category in MetricCategory::ALL {
            assert!(!category.fields().is_empty(), "{category} has no fields");
        }
    }
}
