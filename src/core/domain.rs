//! Domain name gate and normalized key

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::LazyLock;

static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_-]+\.){1}[a-zA-Z]{2,63}$").expect("invalid domain regex")
});

/// Returns true when `raw` looks like a registrable domain such as `example.com`.
pub fn is_valid_domain(raw: &str) -> bool {
    DOMAIN_REGEX.is_match(raw)
}

/// A lower-cased domain name that already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainKey(String);

impl DomainKey {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DomainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domains() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("SerpNames.com"));
        assert!(is_valid_domain("my-site_01.io"));
    }

    #[test]
    fn test_invalid_domains() {
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("example"));
        assert!(!is_valid_domain("sub.example.com"));
        assert!(!is_valid_domain("example.c"));
        assert!(!is_valid_domain("exa mple.com"));
        assert!(!is_valid_domain("https://example.com"));
    }

    #[test]
    fn test_domain_key_is_lowercased() {
        let key = DomainKey::new(" SerpNames.COM ");
        assert_eq!(key.as_str(), "serpnames.com");
        assert_eq!(key.to_string(), "serpnames.com");
    }
}
