use anyhow::{Context, Result};
use discogs_sync_models::OutputDocument;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes output documents as 2-space indented JSON, non-ASCII kept verbatim
pub struct SnapshotWriter;

impl SnapshotWriter {
    pub fn write(path: &Path, document: &OutputDocument) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(document)
            .with_context(|| format!("Failed to serialize snapshot {}", path.display()))?;

        let temp_path = temp_path(path);
        std::fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write snapshot {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to move snapshot into place at {}", path.display()))?;

        debug!("Snapshot saved: {} ({} items)", path.display(), document.items.len());
        Ok(())
    }

    pub fn read(path: &Path) -> Result<OutputDocument> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let document = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        Ok(document)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
