//! Configuration loading for hugind.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.hugin/config.toml` (user)
//! 3. `/etc/hugin/config.toml` (system)
//!
//! The upstream API key is loaded separately with a mandatory permission check:
//! 1. `~/.hugin/secrets.toml` (user, must be 0600)
//! 2. `/etc/hugin/secrets.toml` (system, must be 0600)
//! 3. `INTELLIGENCE_API_KEY` environment variable

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::holdings::InMemoryHoldings;
use crate::types::{Holding, PayloadKind, PortfolioId, Principal};
use crate::upstream::{RetryConfig, UpstreamConfig};
use crate::{HuginError, Result};

/// Environment variable consulted when no secrets file provides a key.
const API_KEY_ENV_VAR: &str = "INTELLIGENCE_API_KEY";

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub intelligence: IntelligenceConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub retry: RetrySection,
    /// Seed data for the in-memory holdings store.
    #[serde(default)]
    pub portfolios: Vec<PortfolioSeed>,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8741).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8741".to_string()
}

/// Upstream Intelligence API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IntelligenceConfig {
    /// Feature flag; when false every cache miss is served from mocks.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IntelligenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:8400".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Cache capacity and per-kind TTLs. Unset fields keep library defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSection {
    pub max_entries: Option<u64>,
    pub dashboard_ttl_secs: Option<u64>,
    pub signals_ttl_secs: Option<u64>,
    pub article_ttl_secs: Option<u64>,
    pub articles_ttl_secs: Option<u64>,
}

/// Retry settings for upstream calls. Unset fields keep library defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

/// One seeded portfolio.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioSeed {
    /// Principal owning the portfolio.
    pub user: String,
    pub id: String,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.hugin/config.toml`
    /// 3. `/etc/hugin/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            HuginError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(HuginError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".hugin").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/hugin/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(HuginError::Configuration(
            "No config file found. Create ~/.hugin/config.toml or /etc/hugin/config.toml"
                .to_string(),
        ))
    }

    /// Cache settings with unset fields left at their defaults.
    pub fn cache_config(&self) -> CacheConfig {
        let section = &self.cache;
        let mut config = CacheConfig::default();
        if let Some(n) = section.max_entries {
            config = config.max_entries(n);
        }
        let ttls = [
            (PayloadKind::Dashboard, section.dashboard_ttl_secs),
            (PayloadKind::Signals, section.signals_ttl_secs),
            (PayloadKind::ArticleDetail, section.article_ttl_secs),
            (PayloadKind::ArticleList, section.articles_ttl_secs),
        ];
        for (kind, secs) in ttls {
            if let Some(secs) = secs {
                config = config.ttl(kind, Duration::from_secs(secs));
            }
        }
        config
    }

    /// Retry settings with unset fields left at their defaults.
    pub fn retry_config(&self) -> RetryConfig {
        let mut config = RetryConfig::default();
        if let Some(n) = self.retry.max_attempts {
            config = config.max_attempts(n);
        }
        if let Some(ms) = self.retry.initial_delay_ms {
            config = config.initial_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.retry.max_delay_ms {
            config = config.max_delay(Duration::from_millis(ms));
        }
        config
    }

    /// Upstream connection settings.
    pub fn upstream_config(&self, api_key: Option<String>) -> UpstreamConfig {
        let mut config = UpstreamConfig::new(&self.intelligence.base_url)
            .timeout(Duration::from_secs(self.intelligence.timeout_secs));
        if let Some(key) = api_key {
            config = config.api_key(key);
        }
        config
    }

    /// In-memory holdings store populated from `[[portfolios]]`.
    pub fn holdings(&self) -> InMemoryHoldings {
        let store = InMemoryHoldings::new();
        for seed in &self.portfolios {
            store.insert(
                Principal::new(&seed.user),
                PortfolioId::new(&seed.id),
                seed.holdings.clone(),
            );
        }
        store
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub intelligence: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (the key may come from the
    /// environment instead).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".hugin").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/hugin/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load a specific secrets file, enforcing permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            HuginError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            HuginError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(HuginError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Upstream API key, falling back to `INTELLIGENCE_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.intelligence
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::HoldingsProvider;
    use std::io::Write;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:8741");
        assert!(config.intelligence.enabled);
        assert_eq!(config.intelligence.timeout_secs, 10);
        assert_eq!(config.cache_config(), CacheConfig::default());
        assert_eq!(config.retry_config(), RetryConfig::default());
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [intelligence]
            enabled = false
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.intelligence.enabled);
        // Defaults preserved
        assert_eq!(config.intelligence.base_url, "http://localhost:8400");
        assert!(config.portfolios.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:8741"

            [intelligence]
            base_url = "https://intel.internal"
            timeout_secs = 3

            [cache]
            max_entries = 500
            signals_ttl_secs = 30

            [retry]
            max_attempts = 4
            initial_delay_ms = 50

            [[portfolios]]
            user = "u1"
            id = "main"
            holdings = [
                { ticker = "AAPL", quantity = 10.0, average_price = 150.0 },
                { ticker = "MSFT", quantity = 5.0, average_price = 280.0, current_price = 300.0 },
            ]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8741");

        let upstream = config.upstream_config(Some("k".into()));
        assert_eq!(upstream.base_url, "https://intel.internal");
        assert_eq!(upstream.timeout, Duration::from_secs(3));
        assert_eq!(upstream.api_key.as_deref(), Some("k"));

        let cache = config.cache_config();
        assert_eq!(cache.max_entries, 500);
        assert_eq!(cache.ttl_for(PayloadKind::Signals), Duration::from_secs(30));
        assert_eq!(cache.ttl_for(PayloadKind::Dashboard), Duration::from_secs(60));

        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 4);
        assert_eq!(retry.initial_delay, Duration::from_millis(50));
        assert_eq!(retry.max_delay, RetryConfig::default().max_delay);

        assert_eq!(config.portfolios[0].holdings[1].current_price, Some(300.0));
    }

    #[tokio::test]
    async fn seeded_holdings_are_served() {
        let toml = r#"
            [[portfolios]]
            user = "u1"
            id = "main"
            holdings = [{ ticker = "AAPL", quantity = 1.0, average_price = 1.0 }]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let store = config.holdings();
        let principal = Principal::new("u1");
        assert_eq!(
            store.default_portfolio(&principal).await.unwrap(),
            Some(PortfolioId::new("main"))
        );
        let rows = store
            .holdings(&principal, &PortfolioId::new("main"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\naddress = \"127.0.0.1:1\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.address, "127.0.0.1:1");
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\naddress =").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn api_key_from_secrets() {
        let secrets: Secrets = toml::from_str(
            r#"
            [intelligence]
            api_key = "from-file"
        "#,
        )
        .unwrap();
        assert_eq!(secrets.api_key(), Some("from-file".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn secrets_with_open_permissions_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[intelligence]\napi_key = \"x\"").unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o644)).unwrap();
        let err = Secrets::load_from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("insecure permissions"));

        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600)).unwrap();
        let secrets = Secrets::load_from_file(file.path()).unwrap();
        assert_eq!(secrets.api_key(), Some("x".to_string()));
    }
}
