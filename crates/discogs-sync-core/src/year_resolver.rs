use anyhow::Result;
use discogs_sync_sources::{DiscogsClient, DiscogsError};
use tracing::{debug, info, warn};
use crate::master_cache::MasterYearCache;
use crate::master_cache_storage::CachePersistence;

/// Counters for one run, reported at the end of a sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub cache_hits: usize,
    pub lookups: usize,
    pub failed_lookups: usize,
}

/// Fills in release years from master releases, through the master-year cache.
///
/// Every new resolution (successful or not) is written through to the
/// persistence layer straight away, so an interrupted run keeps its progress.
pub struct YearResolver<'a> {
    client: &'a DiscogsClient,
    persistence: &'a dyn CachePersistence,
    enabled: bool,
    stats: ResolverStats,
}

impl<'a> YearResolver<'a> {
    pub fn new(client: &'a DiscogsClient, persistence: &'a dyn CachePersistence) -> Self {
        Self {
            client,
            persistence,
            enabled: true,
            stats: ResolverStats::default(),
        }
    }

    /// With master lookups disabled the release's own year is always used
    pub fn with_master_lookups(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Best-effort year for a release: the master's year when known, else the release's own.
    ///
    /// `master_id` must already be filtered to JSON integers; `None` means
    /// no lookup and no cache interaction.
    pub async fn resolve_year(
        &mut self,
        release_year: Option<i32>,
        master_id: Option<i64>,
        cache: &mut MasterYearCache,
    ) -> Result<Option<i32>> {
        let release_year = release_year.filter(|year| *year != 0);

        let master_id = match master_id {
            Some(id) if self.enabled => id,
            _ => return Ok(release_year),
        };

        let master_year = self.master_year(master_id, cache).await?;
        Ok(master_year.filter(|year| *year != 0).or(release_year))
    }

    /// Cached year for `master_id`, looking it up and caching the result on a miss
    pub async fn master_year(&mut self, master_id: i64, cache: &mut MasterYearCache) -> Result<Option<i32>> {
        if let Some(cached) = cache.get(master_id) {
            self.stats.cache_hits += 1;
            debug!("Master {} cache hit -> {:?}", master_id, cached);
            return Ok(cached);
        }

        self.stats.lookups += 1;
        let year = match self.client.get_master_year(master_id).await {
            Ok(year) => year,
            Err(e @ DiscogsError::MasterLookupFailed { .. }) => {
                self.stats.failed_lookups += 1;
                warn!("{}; caching as no year", e);
                None
            }
            Err(e) => return Err(e.into()),
        };

        cache.insert(master_id, year);
        info!(master_id, year = ?year, "Resolved master year");
        self.persistence.save(cache)?;
        Ok(year)
    }
}
