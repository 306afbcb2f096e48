use super::load_config;
use super::sync_ui::SyncUI;
use crate::output::Output;
use color_eyre::Result;
use discogs_sync_config::{Config, DiscogsCredentials, PathManager, SyncOptions};
use discogs_sync_core::{SyncOrchestrator, SyncResult};
use discogs_sync_models::FeedKind;
use discogs_sync_sources::DiscogsClient;
use serde_json::json;
use std::path::PathBuf;

pub async fn run_sync(
    collection: bool,
    wantlist: bool,
    output_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
    no_cache: bool,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Sync command started");

    let (config_file, config) = load_config(config_file)?;
    tracing::debug!("Using configuration from {}", config_file.display());

    let (credentials, sync_options) =
        prepare_sync(&config, |key| std::env::var(key).ok(), collection, wantlist, no_cache)?;

    if !sync_options.collection && !sync_options.wantlist {
        output.warn("Nothing to sync: both collection and wantlist are disabled");
        return Ok(());
    }

    let paths = PathManager::resolve(output_dir, &config)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to resolve output directory: {}", e))?;

    let client = DiscogsClient::from_config(credentials, &config.discogs)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to fetch data from Discogs: {}", e))?;

    let ui = SyncUI::new(output.is_quiet());
    let progress = ui.clone();
    let orchestrator = SyncOrchestrator::new(client, paths, sync_options)
        .with_progress(move |msg| progress.set_message(msg));

    let result = orchestrator.sync().await;
    ui.finish();
    let result = result.map_err(|e| color_eyre::eyre::eyre!("Failed to fetch data from Discogs: {:#}", e))?;

    report(&result, output);
    Ok(())
}

/// Log file under the resolved paths, for `--log-file` given without a value
pub fn default_log_file(output_dir: Option<PathBuf>, config_file: Option<PathBuf>) -> Option<PathBuf> {
    let (_, config) = load_config(config_file).ok()?;
    PathManager::resolve(output_dir, &config).ok().map(|paths| paths.log_file())
}

/// Credentials (always required) and the effective sync options.
/// Explicit feed flags select exactly those feeds, otherwise the config decides.
fn prepare_sync<F>(
    config: &Config,
    lookup: F,
    collection: bool,
    wantlist: bool,
    no_cache: bool,
) -> Result<(DiscogsCredentials, SyncOptions)>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = DiscogsCredentials::from_lookup(lookup)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let mut sync_options = config.sync.clone();
    if collection || wantlist {
        sync_options.collection = collection;
        sync_options.wantlist = wantlist;
    }
    if no_cache {
        sync_options.use_master_cache = false;
    }
    Ok((credentials, sync_options))
}

fn feed_noun(feed: FeedKind) -> &'static str {
    match feed {
        FeedKind::Collection => "collection releases",
        FeedKind::Wantlist => "wantlist items",
    }
}

fn report(result: &SyncResult, output: &Output) {
    if output.is_human() {
        for summary in &result.feeds {
            output.success(format!(
                "Saved {} {} to {}",
                summary.items,
                feed_noun(summary.feed),
                summary.path.display()
            ));
        }
        output.info(format!(
            "Master years: {} cached, {} looked up ({} failed), {} cache entries. Took {:.1?}",
            result.resolver.cache_hits,
            result.resolver.lookups,
            result.resolver.failed_lookups,
            result.cache_entries,
            result.duration
        ));
    } else {
        let feeds: Vec<serde_json::Value> = result
            .feeds
            .iter()
            .map(|s| json!({ "feed": s.feed.name(), "items": s.items, "path": s.path.display().to_string() }))
            .collect();
        output.json(&json!({
            "success": true,
            "feeds": feeds,
            "total_items": result.total_items(),
            "master_cache": {
                "entries": result.cache_entries,
                "cache_hits": result.resolver.cache_hits,
                "lookups": result.resolver.lookups,
                "failed_lookups": result.resolver.failed_lookups,
            },
            "duration_seconds": result.duration.as_secs_f64(),
        }));
    }
}
