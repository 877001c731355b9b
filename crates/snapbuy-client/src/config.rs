//! # Client Configuration
//!
//! Where the backend lives, which tenant this terminal serves and how often
//! the payment and drawer polls tick.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SNAPBUY_API_URL=https://api.snapbuy.vn                             │
//! │     SNAPBUY_TENANT=shop1                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/snapbuy/pos.toml (Linux)                                 │
//! │     ~/Library/Application Support/vn.snapbuy.pos/pos.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pos.toml
//! [api]
//! base_url = "https://api.snapbuy.vn"
//! request_timeout_secs = 15
//! tenant_header = "X-Tenant-ID"
//!
//! [tenant]
//! slug = "shop1"
//!
//! [polling]
//! wallet_interval_secs = 3
//! wallet_max_attempts = 100
//! drawer_interval_secs = 2
//!
//! [notifications]
//! dedup_window_ms = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Root of the REST API, without the `/api` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Header carrying the tenant slug on every request.
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_tenant_header() -> String {
    "X-Tenant-ID".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            tenant_header: default_tenant_header(),
        }
    }
}

// =============================================================================
// Tenant Settings
// =============================================================================

/// Tenant used when none was stored at sign-in or derived from a host name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantSettings {
    #[serde(default)]
    pub slug: Option<String>,
}

// =============================================================================
// Polling Settings
// =============================================================================

/// Cadence of the two background polls.
///
/// ## Timing
/// ```text
/// wallet:  3s × 100 attempts = 5 minutes, then the payment times out
/// drawer:  2s while the close-shift dialog is open
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_wallet_interval")]
    pub wallet_interval_secs: u64,

    #[serde(default = "default_wallet_attempts")]
    pub wallet_max_attempts: u32,

    #[serde(default = "default_drawer_interval")]
    pub drawer_interval_secs: u64,
}

fn default_wallet_interval() -> u64 {
    3
}

fn default_wallet_attempts() -> u32 {
    100
}

fn default_drawer_interval() -> u64 {
    2
}

impl Default for PollingSettings {
    fn default() -> Self {
        PollingSettings {
            wallet_interval_secs: default_wallet_interval(),
            wallet_max_attempts: default_wallet_attempts(),
            drawer_interval_secs: default_drawer_interval(),
        }
    }
}

// =============================================================================
// Notification Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_dedup_window")]
    pub dedup_window_ms: u64,
}

fn default_dedup_window() -> u64 {
    500
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            dedup_window_ms: default_dedup_window(),
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for the credential file. Platform data dir when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub tenant: TenantSettings,

    #[serde(default)]
    pub polling: PollingSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pos.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::Io("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    pub fn validate(&self) -> ClientResult<()> {
        let url = &self.api.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                url
            )));
        }
        url::Url::parse(url)?;

        if self.api.tenant_header.trim().is_empty() {
            return Err(ClientError::Config("tenant_header must not be empty".into()));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.polling.wallet_interval_secs == 0 || self.polling.drawer_interval_secs == 0 {
            return Err(ClientError::Config(
                "poll intervals must be greater than 0".into(),
            ));
        }
        if self.polling.wallet_max_attempts == 0 {
            return Err(ClientError::Config(
                "wallet_max_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `SNAPBUY_*` overrides from `lookup`. Unparseable numbers are
    /// logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("SNAPBUY_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(slug) = lookup("SNAPBUY_TENANT") {
            debug!(tenant = %slug, "Overriding tenant from environment");
            self.tenant.slug = Some(slug);
        }

        if let Some(dir) = lookup("SNAPBUY_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        parse_override(&lookup, "SNAPBUY_REQUEST_TIMEOUT_SECS", &mut self.api.request_timeout_secs);
        parse_override(&lookup, "SNAPBUY_WALLET_POLL_SECS", &mut self.polling.wallet_interval_secs);
        parse_override(&lookup, "SNAPBUY_WALLET_POLL_ATTEMPTS", &mut self.polling.wallet_max_attempts);
        parse_override(&lookup, "SNAPBUY_DRAWER_POLL_SECS", &mut self.polling.drawer_interval_secs);
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("vn", "snapbuy", "pos")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("pos.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Directory holding the credential file.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn wallet_poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.wallet_interval_secs)
    }

    pub fn drawer_poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.drawer_interval_secs)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.notifications.dedup_window_ms)
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "Ignoring unparseable environment override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.polling.wallet_interval_secs, 3);
        assert_eq!(config.polling.wallet_max_attempts, 100);
        assert_eq!(config.polling.drawer_interval_secs, 2);
        assert_eq!(config.notifications.dedup_window_ms, 500);
        assert_eq!(config.api.tenant_header, "X-Tenant-ID");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://api.snapbuy.vn"

            [tenant]
            slug = "shop1"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.snapbuy.vn");
        assert_eq!(config.api.request_timeout_secs, 15);
        assert_eq!(config.tenant.slug.as_deref(), Some("shop1"));
        assert_eq!(config.polling.wallet_max_attempts, 100);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SNAPBUY_API_URL", "https://pos.example.vn"),
            ("SNAPBUY_TENANT", "shop9"),
            ("SNAPBUY_WALLET_POLL_ATTEMPTS", "20"),
            ("SNAPBUY_DRAWER_POLL_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://pos.example.vn");
        assert_eq!(config.tenant.slug.as_deref(), Some("shop9"));
        assert_eq!(config.polling.wallet_max_attempts, 20);
        // Unparseable value keeps the previous setting
        assert_eq!(config.polling.drawer_interval_secs, 2);
    }

    #[test]
    fn test_validation() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://example.com".into();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        let mut config = ClientConfig::default();
        config.polling.wallet_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let mut config = ClientConfig::default();
        config.polling.wallet_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos.toml");

        let mut config = ClientConfig::default();
        config.tenant.slug = Some("shop1".into());
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: ClientConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }
}
