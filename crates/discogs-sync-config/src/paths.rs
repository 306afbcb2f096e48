use anyhow::Result;
use std::path::{Path, PathBuf};
use crate::config::Config;

/// Config file location override
pub fn config_file_override() -> Option<PathBuf> {
    std::env::var("DISCOGS_SYNC_CONFIG").ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Output directory override, used when neither the CLI nor the config file names one
pub fn data_dir_override() -> Option<PathBuf> {
    std::env::var("DISCOGS_SYNC_DATA_DIR").ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Where snapshots, the master cache and logs live
#[derive(Debug, Clone)]
pub struct PathManager {
    output_dir: PathBuf,
    cache_file_name: String,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new(output_dir: PathBuf, cache_file_name: impl Into<String>) -> Self {
        let log_dir = dirs::data_dir()
            .map(|d| d.join("discogs-sync").join("logs"))
            .unwrap_or_else(|| output_dir.join("logs"));
        Self {
            output_dir,
            cache_file_name: cache_file_name.into(),
            log_dir,
        }
    }

    /// Output dir precedence: explicit argument, config file, DISCOGS_SYNC_DATA_DIR, current directory
    pub fn resolve(cli_output_dir: Option<PathBuf>, config: &Config) -> Result<Self> {
        let output_dir = match cli_output_dir
            .or_else(|| config.paths.output_dir.clone())
            .or_else(data_dir_override)
        {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        Ok(Self::new(output_dir, config.paths.cache_file.clone()))
    }

    /// `$DISCOGS_SYNC_CONFIG`, or `config.toml` under the platform config directory
    pub fn default_config_file() -> Result<PathBuf> {
        if let Some(path) = config_file_override() {
            return Ok(path);
        }
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("discogs-sync");
        Ok(base_dir.join("config.toml"))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn cache_file(&self) -> PathBuf {
        self.output_dir.join(&self.cache_file_name)
    }

    pub fn snapshot_file(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("discogs-sync.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_inside_output_dir() {
        let paths = PathManager::new(PathBuf::from("/srv/records"), "masters_cache.json");
        assert_eq!(paths.cache_file(), PathBuf::from("/srv/records/masters_cache.json"));
        assert_eq!(paths.snapshot_file("collection.json"), PathBuf::from("/srv/records/collection.json"));
    }

    #[test]
    fn test_log_file_name() {
        let paths = PathManager::new(PathBuf::from("/srv/records"), "masters_cache.json");
        let log_file = paths.log_file();
        assert_eq!(log_file.file_name().and_then(|n| n.to_str()), Some("discogs-sync.log"));
        assert_eq!(log_file.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()), Some("logs"));
    }

    #[test]
    fn test_resolve_prefers_cli_then_config() {
        let mut config = Config::default();
        config.paths.output_dir = Some(PathBuf::from("/from/config"));

        let paths = PathManager::resolve(Some(PathBuf::from("/from/cli")), &config).unwrap();
        assert_eq!(paths.output_dir(), Path::new("/from/cli"));

        let paths = PathManager::resolve(None, &config).unwrap();
        assert_eq!(paths.output_dir(), Path::new("/from/config"));
    }

    #[test]
    fn test_resolve_uses_configured_cache_name() {
        let mut config = Config::default();
        config.paths.cache_file = "years.json".to_string();
        let paths = PathManager::resolve(Some(PathBuf::from("/data")), &config).unwrap();
        assert_eq!(paths.cache_file(), PathBuf::from("/data/years.json"));
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::new(dir.path().join("nested/out"), "masters_cache.json");
        paths.ensure_directories().unwrap();
        assert!(paths.output_dir().is_dir());
    }
}
