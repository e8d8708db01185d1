use crate::core::category::ProviderId;
use crate::core::quota::QuotaPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProviderEndpoint {
    fn public(base_url: &str) -> Self {
        ProviderEndpoint {
            base_url: base_url.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub links: ProviderEndpoint,
    pub appraisal: ProviderEndpoint,
    pub index: ProviderEndpoint,
    pub dns_history: ProviderEndpoint,
    pub redirects: ProviderEndpoint,
    pub whois: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            links: ProviderEndpoint::public("https://domdetailer.com"),
            appraisal: ProviderEndpoint::public("https://api.godaddy.com"),
            index: ProviderEndpoint::public("https://trueimperium.com"),
            dns_history: ProviderEndpoint::public("http://api.completedns.com"),
            redirects: ProviderEndpoint::public("https://host.io"),
            whois: ProviderEndpoint::public("https://api.apilayer.com"),
        }
    }
}

impl ProvidersConfig {
    pub fn endpoint(&self, provider: ProviderId) -> &ProviderEndpoint {
        match provider {
            ProviderId::Links => &self.links,
            ProviderId::Appraisal => &self.appraisal,
            ProviderId::Index => &self.index,
            ProviderId::DnsHistory => &self.dns_history,
            ProviderId::Redirects => &self.redirects,
            ProviderId::Whois => &self.whois,
        }
    }

    /// Environment variable that overrides the configured key of a provider.
    pub fn api_key_env(provider: ProviderId) -> &'static str {
        match provider {
            ProviderId::Links => "DOMDETAILER_API_KEY",
            ProviderId::Appraisal => "APPRAISAL_API_KEY",
            ProviderId::Index => "INDEX_API_KEY",
            ProviderId::DnsHistory => "COMPLETEDNS_API_KEY",
            ProviderId::Redirects => "HOSTIO_API_KEY",
            ProviderId::Whois => "WHOIS_API_KEY",
        }
    }

    /// Key for `provider`, preferring the environment over the config file.
    pub fn api_key(&self, provider: ProviderId) -> Option<String> {
        std::env::var(Self::api_key_env(provider))
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.endpoint(provider).api_key.clone())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct QuotaConfig {
    pub max_requests: u32,
    pub window_hours: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        QuotaConfig {
            max_requests: 10,
            window_hours: 24,
        }
    }
}

impl QuotaConfig {
    pub fn policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            max_requests: self.max_requests,
            window: chrono::Duration::hours(i64::from(self.window_hours)),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum number of redirected domains listed; the total is always shown.
    #[serde(default)]
    pub redirect_display_cap: Option<usize>,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            quota: QuotaConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
            redirect_display_cap: None,
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "serpnames", "domain-metrics")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "serpnames", "domain-metrics")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
