//! catalog-sync configuration (`config.toml`)
//!
//! ```toml
//! [catalog]
//! base_url = "https://api.example.com/api/v2/architecture"
//! token = "..."
//! timeout_secs = 30
//! page_size = 100
//!
//! [sync]
//! domain = "orders"
//! bump_strategy = "minor"
//! target_state = "released"
//! retries = 2
//! shared_events = false
//! broker_type = "solace"
//! ```
//!
//! A missing file yields defaults. CLI flags and `CATALOG_SYNC_*` environment
//! variables override file values.

use anyhow::{Context, Result};
use catalog::backend::http::{DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS, HttpConfig};
use declarative::{BumpStrategy, LifecycleState, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::paths;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub sync: SyncConfig,
}

/// Connection to the catalog service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Defaults for `sync`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Application domain name, when the document does not name one
    pub domain: Option<String>,
    pub bump_strategy: BumpStrategy,
    pub target_state: LifecycleState,
    /// Extra attempts per resource after a transient failure (0 = no retry)
    pub retries: u32,
    pub shared_events: bool,
    pub broker_type: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            domain: None,
            bump_strategy: BumpStrategy::default(),
            target_state: LifecycleState::default(),
            retries: 2,
            shared_events: false,
            broker_type: "solace".to_string(),
        }
    }
}

impl SyncConfig {
    /// Retry policy for one resource: the first attempt plus `retries`
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_attempts(self.retries.saturating_add(1))
    }
}

impl Config {
    /// Load the config file from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load a config file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

impl CatalogConfig {
    /// Connection settings for the HTTP backend
    pub fn http_config(&self) -> Result<HttpConfig> {
        let base_url = self
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .context("No catalog base URL configured (set catalog.base_url or CATALOG_SYNC_BASE_URL)")?;

        let mut config = HttpConfig::new(base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .page_size(self.page_size);
        if let Some(token) = &self.token {
            config = config.token(token.clone());
        }
        Ok(config)
    }

    /// Token with everything but the last four characters hidden
    pub fn masked_token(&self) -> Option<String> {
        self.token.as_ref().map(|token| {
            let visible: String = token
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            if token.chars().count() <= 4 {
                "****".to_string()
            } else {
                format!("****{visible}")
            }
        })
    }
}
