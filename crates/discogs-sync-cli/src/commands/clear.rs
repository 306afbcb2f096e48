use super::load_config;
use crate::output::Output;
use color_eyre::Result;
use discogs_sync_config::PathManager;
use discogs_sync_core::MasterCacheStorage;
use discogs_sync_models::FeedKind;
use std::fs;
use std::path::PathBuf;

pub fn run_clear(all: bool, cache: bool, snapshots: bool, output_dir: Option<PathBuf>, output: &Output) -> Result<()> {
    if !(all || cache || snapshots) {
        output.warn("No clear option specified. Use --cache, --snapshots, or --all");
        output.info("\nExample: discogs-sync clear --cache");
        return Ok(());
    }

    let (_, config) = load_config(None)?;
    let path_manager = PathManager::resolve(output_dir, &config)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to resolve output directory: {}", e))?;

    if all || cache {
        clear_cache(&path_manager, output)?;
    }
    if all || snapshots {
        clear_snapshots(&path_manager, output)?;
    }
    Ok(())
}

fn clear_cache(path_manager: &PathManager, output: &Output) -> Result<()> {
    let storage = MasterCacheStorage::new(path_manager.cache_file());
    let removed = storage
        .clear()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to remove master cache at {}: {}", storage.path().display(), e))?;

    if removed {
        output.success(format!("Cleared master cache: {}", storage.path().display()));
    } else {
        output.info("No master cache found to clear");
    }
    Ok(())
}

fn clear_snapshots(path_manager: &PathManager, output: &Output) -> Result<()> {
    let mut cleared = 0;
    for feed in FeedKind::all() {
        let path = path_manager.snapshot_file(&feed.file_name());
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| color_eyre::eyre::eyre!("Failed to remove {}: {}", path.display(), e))?;
            output.success(format!("Cleared {} snapshot: {}", feed, path.display()));
            cleared += 1;
        }
    }
    if cleared == 0 {
        output.info("No snapshots found to clear");
    }
    Ok(())
}
