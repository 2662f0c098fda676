//! Dashboard configuration, stored in ~/.enrolment-dashboard/config.json.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::RetryPolicy;
use crate::types::DEFAULT_YEAR;

/// Environment variable that overrides `baseUrl`.
pub const BACKEND_URL_ENV: &str = "ENROLMENT_DASHBOARD_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prefix for the filter and stats routes.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Prefix for the recommendation route, which the backend mounts at the root.
    #[serde(default)]
    pub insight_prefix: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_insight_timeout_secs")]
    pub insight_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default = "default_year")]
    pub default_year: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_insight_timeout_secs() -> u64 {
    15
}

fn default_year() -> String {
    DEFAULT_YEAR.to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            insight_prefix: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            insight_timeout_secs: default_insight_timeout_secs(),
            retry: RetryPolicy::default(),
            default_year: default_year(),
        }
    }
}

impl DashboardConfig {
    /// Root for filter and stats routes, without trailing slash.
    pub fn api_root(&self) -> String {
        join_root(&self.base_url, &self.api_prefix)
    }

    /// Root for the recommendation route, without trailing slash.
    pub fn insight_root(&self) -> String {
        join_root(&self.base_url, &self.insight_prefix)
    }

    fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid baseUrl '{}': {}", self.base_url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!(
                "Invalid baseUrl '{}': scheme must be http or https",
                self.base_url
            ));
        }
        if self.insight_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("Timeouts must be at least one second".to_string());
        }
        Ok(())
    }
}

fn join_root(base: &str, prefix: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let base = base.trim_end_matches('/');
    if prefix.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, prefix)
    }
}

/// Default config file location.
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".enrolment-dashboard").join("config.json"))
}

/// Load configuration from the default location, then apply the
/// environment override. A missing file yields defaults.
pub fn load_config() -> Result<DashboardConfig, String> {
    let path = config_path()?;
    let mut config = load_config_from(&path)?;
    if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
        if !url.trim().is_empty() {
            config.base_url = url.trim().to_string();
        }
    }
    config.validate()?;
    Ok(config)
}

/// Load configuration from an explicit path. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<DashboardConfig, String> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(DashboardConfig::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

    let config: DashboardConfig =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

    config.validate()?;
    Ok(config)
}
