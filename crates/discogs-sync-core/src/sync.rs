use anyhow::{Context, Result};
use chrono::Utc;
use discogs_sync_config::{PathManager, SyncOptions};
use discogs_sync_models::{FeedKind, NormalizedRecord, OutputDocument};
use discogs_sync_sources::DiscogsClient;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};
use crate::master_cache::MasterYearCache;
use crate::master_cache_storage::{CachePersistence, MasterCacheStorage};
use crate::normalizer::{Normalizer, NormalizerOptions};
use crate::snapshot::SnapshotWriter;
use crate::year_resolver::{ResolverStats, YearResolver};

/// Runs the collection and wantlist pipelines one after the other and writes their snapshots.
///
/// Snapshots are only written once every enabled feed has been fetched and
/// normalized, so a failed run leaves the previous snapshots untouched. The
/// master cache is written through during the run and survives a failure.
pub struct SyncOrchestrator {
    client: DiscogsClient,
    paths: PathManager,
    sync_options: SyncOptions,
    feeds: Vec<FeedKind>,
    progress: Option<Box<dyn Fn(&str)>>,
}

#[derive(Debug, Clone)]
pub struct FeedSummary {
    pub feed: FeedKind,
    pub items: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SyncResult {
    pub feeds: Vec<FeedSummary>,
    pub cache_entries: usize,
    pub resolver: ResolverStats,
    pub duration: Duration,
}

impl SyncResult {
    pub fn items_for(&self, feed: FeedKind) -> Option<usize> {
        self.feeds.iter().find(|s| s.feed == feed).map(|s| s.items)
    }

    pub fn total_items(&self) -> usize {
        self.feeds.iter().map(|s| s.items).sum()
    }
}

impl SyncOrchestrator {
    pub fn new(client: DiscogsClient, paths: PathManager, sync_options: SyncOptions) -> Self {
        let feeds = FeedKind::all()
            .into_iter()
            .filter(|feed| match feed {
                FeedKind::Collection => sync_options.collection,
                FeedKind::Wantlist => sync_options.wantlist,
            })
            .collect();
        Self {
            client,
            paths,
            sync_options,
            feeds,
            progress: None,
        }
    }

    /// Restrict the run to the given feeds (kept in collection, wantlist order)
    pub fn with_feeds(mut self, feeds: &[FeedKind]) -> Self {
        self.feeds = FeedKind::all()
            .into_iter()
            .filter(|feed| feeds.contains(feed))
            .collect();
        self
    }

    pub fn with_progress(mut self, progress: impl Fn(&str) + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn feeds(&self) -> &[FeedKind] {
        &self.feeds
    }

    fn report(&self, message: &str) {
        debug!("{}", message);
        if let Some(progress) = &self.progress {
            progress(message);
        }
    }

    #[instrument(skip(self), fields(user = %self.client.username()))]
    pub async fn sync(&self) -> Result<SyncResult> {
        let start = Instant::now();
        self.paths.ensure_directories()?;

        let storage = MasterCacheStorage::new(self.paths.cache_file());
        let use_cache = self.sync_options.use_master_cache;
        let mut cache = if use_cache {
            storage.load_or_create()?
        } else {
            MasterYearCache::new()
        };

        let mut resolver = YearResolver::new(&self.client, &storage).with_master_lookups(use_cache);

        let mut prepared: Vec<(FeedKind, Vec<NormalizedRecord>)> = Vec::new();
        for &feed in &self.feeds {
            self.report(&format!("Fetching {}...", feed));
            let entries = self
                .client
                .fetch_feed(feed)
                .await
                .with_context(|| format!("Failed to fetch {}", feed))?;

            self.report(&format!("Normalizing {} {} entries...", entries.len(), feed));
            let normalizer = Normalizer::new(NormalizerOptions::for_feed(feed, &self.sync_options));
            let records = normalizer.normalize(&entries, &mut resolver, &mut cache).await?;
            info!("Normalized {} {} items", records.len(), feed);
            prepared.push((feed, records));
        }

        if use_cache && cache.is_dirty() {
            storage.save(&cache)?;
        }
        cache.mark_clean();

        let mut summaries = Vec::new();
        for (feed, records) in prepared {
            let path = self.paths.snapshot_file(&feed.file_name());
            let items = records.len();
            SnapshotWriter::write(&path, &OutputDocument::stamped(Utc::now(), records))?;
            info!("Saved {} {} items to {}", items, feed, path.display());
            summaries.push(FeedSummary { feed, items, path });
        }

        let stats = resolver.stats();
        info!(
            "Master years: {} cache hits, {} lookups ({} failed), {} cached entries",
            stats.cache_hits,
            stats.lookups,
            stats.failed_lookups,
            cache.len()
        );

        Ok(SyncResult {
            feeds: summaries,
            cache_entries: cache.len(),
            resolver: stats,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discogs_sync_config::{DiscogsConfig, DiscogsCredentials};
    use discogs_sync_sources::testing::ScriptedTransport;
    use discogs_sync_sources::ApiResponse;
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "https://api.test";

    fn client(transport: &Arc<ScriptedTransport>) -> DiscogsClient {
        let config = DiscogsConfig {
            base_url: BASE.to_string(),
            ..DiscogsConfig::default()
        };
        DiscogsClient::new(transport.clone(), DiscogsCredentials::new("digger", "token"), &config)
    }

    fn collection_page(page: u32) -> String {
        format!("{}/users/digger/collection/folders/0/releases?per_page=100&page={}", BASE, page)
    }

    fn wantlist_page(page: u32) -> String {
        format!("{}/users/digger/wants?per_page=100&page={}", BASE, page)
    }

    fn script_happy_path(transport: &ScriptedTransport) {
        transport
            .respond(&collection_page(1), ApiResponse::ok_json(&json!({
                "pagination": { "pages": 1 },
                "releases": [
                    { "basic_information": { "id": 11, "title": "Mezzanine", "year": 1998, "master_id": 100,
                                             "artists": [{ "name": "Massive Attack" }], "genres": ["Electronic"] } },
                    { "basic_information": { "id": 12, "title": "Dummy", "year": 0, "master_id": 200,
                                             "artists": [{ "name": "Portishead" }], "genres": ["Electronic"] } }
                ]
            })))
            .respond(&wantlist_page(1), ApiResponse::ok_json(&json!({
                "pagination": { "pages": 1 },
                "wants": [
                    { "notes": "purchasing next week",
                      "basic_information": { "id": 21, "title": "Blue Lines", "year": 1991, "master_id": 100,
                                             "artists": [{ "name": "Massive Attack" }] } },
                    { "notes": 42,
                      "basic_information": { "id": 22, "title": "Vespertine", "year": 2001,
                                             "artists": [{ "name": "Björk" }] } }
                ]
            })))
            .respond(&format!("{}/masters/100", BASE), ApiResponse::ok_json(&json!({ "year": 1998 })))
            .respond(&format!("{}/masters/200", BASE), ApiResponse::new(404, "not found"));
    }

    #[tokio::test]
    async fn test_sync_writes_both_snapshots_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        script_happy_path(&transport);

        let paths = PathManager::new(dir.path().to_path_buf(), "masters_cache.json");
        let orchestrator = SyncOrchestrator::new(client(&transport), paths.clone(), SyncOptions::default());
        let result = orchestrator.sync().await.unwrap();

        assert_eq!(result.items_for(FeedKind::Collection), Some(2));
        assert_eq!(result.items_for(FeedKind::Wantlist), Some(2));
        assert_eq!(result.total_items(), 4);
        assert_eq!(result.resolver.lookups, 2);
        assert_eq!(result.resolver.cache_hits, 1);
        // master 100 is shared by both feeds and looked up once
        assert_eq!(transport.count_matching(&format!("{}/masters/100", BASE)), 1);

        let collection = SnapshotWriter::read(&paths.snapshot_file("collection.json")).unwrap();
        assert_eq!(collection.items[0].artist, "Massive Attack");
        assert_eq!(collection.items[0].year, Some(1998));
        assert_eq!(collection.items[1].artist, "Portishead");
        assert_eq!(collection.items[1].year, None);
        assert_eq!(collection.items[1].purchasing, None);

        let wantlist = SnapshotWriter::read(&paths.snapshot_file("wantlist.json")).unwrap();
        assert_eq!(wantlist.items[0].artist, "Björk");
        assert_eq!(wantlist.items[0].purchasing, Some(false));
        assert_eq!(wantlist.items[1].album, "Blue Lines");
        assert_eq!(wantlist.items[1].year, Some(1998));
        assert_eq!(wantlist.items[1].purchasing, Some(true));

        let cache: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(paths.cache_file()).unwrap()).unwrap();
        assert_eq!(cache, json!({ "100": 1998, "200": null }));
    }

    #[tokio::test]
    async fn test_sync_uses_existing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::new(dir.path().to_path_buf(), "masters_cache.json");
        std::fs::write(paths.cache_file(), r#"{"100": 1994}"#).unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(&collection_page(1), ApiResponse::ok_json(&json!({
            "releases": [
                { "basic_information": { "id": 1, "title": "Dummy", "master_id": 100, "year": null,
                                         "artists": [{ "name": "Portishead" }] } }
            ]
        })));

        let orchestrator = SyncOrchestrator::new(client(&transport), paths.clone(), SyncOptions::default())
            .with_feeds(&[FeedKind::Collection]);
        let result = orchestrator.sync().await.unwrap();

        assert_eq!(result.feeds.len(), 1);
        assert_eq!(transport.request_count(), 1);
        let collection = SnapshotWriter::read(&paths.snapshot_file("collection.json")).unwrap();
        assert_eq!(collection.items[0].year, Some(1994));
        assert!(!paths.snapshot_file("wantlist.json").exists());
    }

    #[tokio::test]
    async fn test_failed_wantlist_writes_no_snapshots_but_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond(&collection_page(1), ApiResponse::ok_json(&json!({
                "releases": [
                    { "basic_information": { "id": 1, "title": "Mezzanine", "master_id": 100,
                                             "artists": [{ "name": "Massive Attack" }] } }
                ]
            })))
            .respond(&format!("{}/masters/100", BASE), ApiResponse::ok_json(&json!({ "year": 1998 })))
            .respond(&wantlist_page(1), ApiResponse::new(429, "slow down"));

        let paths = PathManager::new(dir.path().to_path_buf(), "masters_cache.json");
        let orchestrator = SyncOrchestrator::new(client(&transport), paths.clone(), SyncOptions::default());
        let err = orchestrator.sync().await.unwrap_err();

        assert!(format!("{:#}", err).contains("rate limits"));
        assert!(!paths.snapshot_file("collection.json").exists());
        assert!(!paths.snapshot_file("wantlist.json").exists());

        let cache: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(paths.cache_file()).unwrap()).unwrap();
        assert_eq!(cache, json!({ "100": 1998 }));
    }

    #[tokio::test]
    async fn test_sync_without_master_cache() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(&wantlist_page(1), ApiResponse::ok_json(&json!({
            "wants": [
                { "basic_information": { "id": 5, "title": "Tago Mago", "year": 1971, "master_id": 300,
                                         "artists": [{ "name": "Can" }] } }
            ]
        })));

        let options = SyncOptions {
            collection: false,
            use_master_cache: false,
            include_id: false,
            include_genre: false,
            ..SyncOptions::default()
        };
        let paths = PathManager::new(dir.path().to_path_buf(), "masters_cache.json");
        let orchestrator = SyncOrchestrator::new(client(&transport), paths.clone(), options);
        assert_eq!(orchestrator.feeds(), &[FeedKind::Wantlist]);

        orchestrator.sync().await.unwrap();

        assert_eq!(transport.request_count(), 1);
        assert!(!paths.cache_file().exists());

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(paths.snapshot_file("wantlist.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            raw["items"],
            json!([{ "artist": "Can", "album": "Tago Mago", "year": 1971, "purchasing": false }])
        );
    }

    #[tokio::test]
    async fn test_progress_messages() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(&collection_page(1), ApiResponse::ok_json(&json!({ "releases": [] })));

        let messages = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = messages.clone();
        let paths = PathManager::new(dir.path().to_path_buf(), "masters_cache.json");
        let orchestrator = SyncOrchestrator::new(client(&transport), paths, SyncOptions::default())
            .with_feeds(&[FeedKind::Collection])
            .with_progress(move |msg| sink.borrow_mut().push(msg.to_string()));

        orchestrator.sync().await.unwrap();
        assert_eq!(messages.borrow()[0], "Fetching collection...");
    }
}
