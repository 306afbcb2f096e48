use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde_json::Value;
use tracing::{debug, info, warn};
use crate::master_cache::MasterYearCache;

/// Persists the whole master-year cache. Called after every new resolution.
pub trait CachePersistence {
    fn save(&self, cache: &MasterYearCache) -> Result<()>;
}

/// Master-year cache stored as a flat, pretty-printed JSON object: `{"<master id>": year | null}`.
///
/// The file is rewritten in full on each save; two processes must not share it.
pub struct MasterCacheStorage {
    cache_path: PathBuf,
}

impl MasterCacheStorage {
    pub fn new(cache_path: PathBuf) -> Self {
        Self { cache_path }
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    pub fn cache_exists(&self) -> bool {
        self.cache_path.exists()
    }

    /// Load the cache, creating an empty cache file if there is none yet.
    ///
    /// An unreadable or malformed file is backed up next to the original and
    /// replaced by an empty cache rather than failing the run.
    pub fn load_or_create(&self) -> Result<MasterYearCache> {
        if !self.cache_path.exists() {
            debug!("Master cache {:?} does not exist, creating empty cache file", self.cache_path);
            let cache = MasterYearCache::new();
            self.write(&cache)?;
            return Ok(cache);
        }

        let content = match std::fs::read_to_string(&self.cache_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read master cache {:?}: {}. Starting with empty cache.", self.cache_path, e);
                return Ok(MasterYearCache::new());
            }
        };

        match serde_json::from_str::<BTreeMap<String, Value>>(&content) {
            Ok(raw) => {
                let mut entries = BTreeMap::new();
                let mut skipped = 0;
                for (key, value) in raw {
                    match cached_year(&value) {
                        Some(year) => {
                            entries.insert(key, year);
                        }
                        None => {
                            warn!("Ignoring master cache entry {:?}: {} is not a year", key, value);
                            skipped += 1;
                        }
                    }
                }
                let cache = MasterYearCache::from_entries(entries);
                info!(
                    "Loaded master cache: {} entries ({} without year, {} ignored) from {:?}",
                    cache.len(),
                    cache.unresolved_count(),
                    skipped,
                    self.cache_path
                );
                Ok(cache)
            }
            Err(e) => {
                let backup_path = self.cache_path.with_extension("json.bak");
                if let Err(backup_err) = std::fs::copy(&self.cache_path, &backup_path) {
                    warn!(
                        "Failed to backup unreadable master cache: {}. Starting with empty cache.",
                        backup_err
                    );
                } else {
                    warn!(
                        "Master cache is not a valid id→year object ({}). Backed up to {:?} and starting with empty cache.",
                        e, backup_path
                    );
                }
                Ok(MasterYearCache::new())
            }
        }
    }

    fn write(&self, cache: &MasterYearCache) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(cache.entries())?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.cache_path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.cache_path)?;

        debug!("Saved master cache: {} entries to {:?}", cache.len(), self.cache_path);
        Ok(())
    }

    /// Delete the cache file, returning whether there was one
    pub fn clear(&self) -> Result<bool> {
        if self.cache_path.exists() {
            std::fs::remove_file(&self.cache_path)?;
            info!("Removed master cache {:?}", self.cache_path);
            return Ok(true);
        }
        Ok(false)
    }
}

/// Cached value for one entry: null, an integer year, or an integer written as a
/// string or whole float. `None` when the entry is unusable.
fn cached_year(value: &Value) -> Option<Option<i32>> {
    let year = match value {
        Value::Null => return Some(None),
        Value::Number(n) => match n.as_i64() {
            Some(year) => year,
            None => n.as_f64().filter(|f| f.fract() == 0.0)? as i64,
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(year).ok().map(Some)
}

impl CachePersistence for MasterCacheStorage {
    fn save(&self, cache: &MasterYearCache) -> Result<()> {
        self.write(cache)
    }
}
