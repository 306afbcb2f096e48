use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use crate::error::ConfigError;

/// Top-level configuration, read from `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discogs: DiscogsConfig,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscogsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub rate_limit: RateLimitPolicy,
}

/// What to do when Discogs answers 429 Too Many Requests.
///
/// Retrying is opt-in and always bounded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RateLimitPolicy {
    #[default]
    Fail,
    BackoffRetry {
        max_attempts: u32,
        base_delay_ms: u64,
        /// Upper bound for any single wait, Retry-After included
        #[serde(default = "default_max_delay_ms")]
        max_delay_ms: u64,
    },
}

impl RateLimitPolicy {
    /// Delay before retry number `attempt` (0-based), or None once retries are exhausted.
    /// A server-provided Retry-After wins over the exponential schedule; either is
    /// clamped to `max_delay_ms`.
    pub fn retry_delay(&self, attempt: u32, retry_after_secs: Option<u64>) -> Option<Duration> {
        match self {
            RateLimitPolicy::Fail => None,
            RateLimitPolicy::BackoffRetry { max_attempts, base_delay_ms, max_delay_ms } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let delay_ms = match retry_after_secs {
                    Some(secs) => secs.saturating_mul(1000),
                    None => base_delay_ms.saturating_mul(2u64.saturating_pow(attempt)),
                };
                Some(Duration::from_millis(delay_ms.min(*max_delay_ms)))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default = "default_true")]
    pub collection: bool,
    #[serde(default = "default_true")]
    pub wantlist: bool,
    /// Resolve years through master releases, backed by the on-disk cache
    #[serde(default = "default_true")]
    pub use_master_cache: bool,
    #[serde(default = "default_true")]
    pub include_id: bool,
    #[serde(default = "default_true")]
    pub include_genre: bool,
    #[serde(default = "default_purchasing_marker")]
    pub purchasing_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
}

pub fn default_base_url() -> String {
    "https://api.discogs.com".to_string()
}

pub fn default_user_agent() -> String {
    format!("discogs-sync/{}", env!("CARGO_PKG_VERSION"))
}

fn default_per_page() -> u32 {
    100 // Discogs maximum
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_true() -> bool {
    true
}

fn default_purchasing_marker() -> String {
    // matches purchase, purchasing, purchased
    "purchas".to_string()
}

pub fn default_cache_file() -> String {
    "masters_cache.json".to_string()
}

impl Default for DiscogsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            per_page: default_per_page(),
            timeout_secs: default_timeout_secs(),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

impl DiscogsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            collection: true,
            wantlist: true,
            use_master_cache: true,
            include_id: true,
            include_genre: true,
            purchasing_marker: default_purchasing_marker(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            cache_file: default_cache_file(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Config::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discogs.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("discogs.base_url cannot be empty".to_string()));
        }
        if !(1..=100).contains(&self.discogs.per_page) {
            return Err(ConfigError::Invalid(format!(
                "discogs.per_page must be between 1 and 100, got {}",
                self.discogs.per_page
            )));
        }
        if self.discogs.timeout_secs == 0 {
            return Err(ConfigError::Invalid("discogs.timeout_secs must be greater than 0".to_string()));
        }
        if let RateLimitPolicy::BackoffRetry { max_attempts, .. } = self.discogs.rate_limit {
            if max_attempts == 0 {
                return Err(ConfigError::Invalid(
                    "discogs.rate_limit.max_attempts must be greater than 0 (use policy = \"fail\" to disable retries)".to_string(),
                ));
            }
        }
        if self.paths.cache_file.trim().is_empty() {
            return Err(ConfigError::Invalid("paths.cache_file cannot be empty".to_string()));
        }
        if self.sync.purchasing_marker.is_empty() {
            return Err(ConfigError::Invalid("sync.purchasing_marker cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.discogs.base_url, "https://api.discogs.com");
        assert_eq!(config.discogs.per_page, 100);
        assert_eq!(config.discogs.timeout_secs, 30);
        assert_eq!(config.discogs.rate_limit, RateLimitPolicy::Fail);
        assert_eq!(config.paths.cache_file, "masters_cache.json");
        assert_eq!(config.sync.purchasing_marker, "purchas");
        assert!(config.sync.collection);
        assert!(config.sync.wantlist);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [discogs]
            per_page = 50

            [discogs.rate_limit]
            policy = "backoff_retry"
            max_attempts = 3
            base_delay_ms = 500

            [sync]
            wantlist = false
            "#,
        )
        .unwrap();

        assert_eq!(config.discogs.per_page, 50);
        assert_eq!(config.discogs.base_url, "https://api.discogs.com");
        assert_eq!(
            config.discogs.rate_limit,
            RateLimitPolicy::BackoffRetry { max_attempts: 3, base_delay_ms: 500, max_delay_ms: 60_000 }
        );
        assert!(config.sync.collection);
        assert!(!config.sync.wantlist);
        assert!(config.sync.use_master_cache);
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.paths.output_dir = Some(PathBuf::from("/srv/records"));
        config.sync.include_genre = false;

        config.save_to_file(file.path()).unwrap();
        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.paths.output_dir, Some(PathBuf::from("/srv/records")));
        assert_eq!(loaded.sync.include_genre, false);
        assert_eq!(loaded.discogs.rate_limit, RateLimitPolicy::Fail);
    }

    #[test]
    fn test_config_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.discogs.per_page, 100);
    }

    #[test]
    fn test_config_parse_error() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[discogs\nper_page = ").unwrap();
        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        config.discogs.per_page = 0;
        assert!(config.validate().is_err());

        config.discogs.per_page = 101;
        assert!(config.validate().is_err());

        config.discogs.per_page = 100;
        config.discogs.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.discogs.timeout_secs = 30;
        config.discogs.rate_limit = RateLimitPolicy::BackoffRetry { max_attempts: 0, base_delay_ms: 100, max_delay_ms: 60_000 };
        assert!(config.validate().is_err());

        config.discogs.rate_limit = RateLimitPolicy::BackoffRetry { max_attempts: 2, base_delay_ms: 100, max_delay_ms: 60_000 };
        assert!(config.validate().is_ok());

        config.paths.cache_file = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_policy_delays() {
        assert_eq!(RateLimitPolicy::Fail.retry_delay(0, None), None);
        assert_eq!(RateLimitPolicy::Fail.retry_delay(0, Some(5)), None);

        let policy = RateLimitPolicy::BackoffRetry { max_attempts: 3, base_delay_ms: 100, max_delay_ms: 60_000 };
        assert_eq!(policy.retry_delay(0, None), Some(Duration::from_millis(100)));
        assert_eq!(policy.retry_delay(1, None), Some(Duration::from_millis(200)));
        assert_eq!(policy.retry_delay(2, None), Some(Duration::from_millis(400)));
        assert_eq!(policy.retry_delay(3, None), None);
        assert_eq!(policy.retry_delay(1, Some(7)), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_rate_limit_delay_is_capped() {
        let policy = RateLimitPolicy::BackoffRetry { max_attempts: 10, base_delay_ms: 1_000, max_delay_ms: 5_000 };
        assert_eq!(policy.retry_delay(0, Some(86_400)), Some(Duration::from_millis(5_000)));
        assert_eq!(policy.retry_delay(0, Some(u64::MAX)), Some(Duration::from_millis(5_000)));
        assert_eq!(policy.retry_delay(2, None), Some(Duration::from_millis(4_000)));
        assert_eq!(policy.retry_delay(3, None), Some(Duration::from_millis(5_000)));
        assert_eq!(policy.retry_delay(2, Some(3)), Some(Duration::from_secs(3)));
    }
}
