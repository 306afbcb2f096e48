use anyhow::Result;
use discogs_sync_config::SyncOptions;
use discogs_sync_models::{ArtistRef, FeedKind, NormalizedRecord, RawEntry};
use serde_json::Value;
use crate::master_cache::MasterYearCache;
use crate::year_resolver::YearResolver;

/// Which optional fields end up in the normalized records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerOptions {
    pub include_id: bool,
    pub include_genre: bool,
    pub include_purchasing: bool,
    pub purchasing_marker: String,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            include_id: true,
            include_genre: true,
            include_purchasing: false,
            purchasing_marker: "purchas".to_string(),
        }
    }
}

impl NormalizerOptions {
    pub fn for_feed(feed: FeedKind, sync: &SyncOptions) -> Self {
        Self {
            include_id: sync.include_id,
            include_genre: sync.include_genre,
            include_purchasing: feed.carries_notes(),
            purchasing_marker: sync.purchasing_marker.to_lowercase(),
        }
    }
}

pub struct Normalizer {
    options: NormalizerOptions,
}

impl Normalizer {
    pub fn new(options: NormalizerOptions) -> Self {
        Self { options }
    }

    /// Normalize every entry (resolving years through `resolver`) and sort the result
    pub async fn normalize(
        &self,
        entries: &[RawEntry],
        resolver: &mut YearResolver<'_>,
        cache: &mut MasterYearCache,
    ) -> Result<Vec<NormalizedRecord>> {
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let info = entry.info();
            let year = resolver
                .resolve_year(info.release_year(), info.master_id(), cache)
                .await?;
            records.push(self.to_record(entry, year));
        }
        sort_records(&mut records);
        Ok(records)
    }

    /// Build the record for one entry once its year is known
    pub fn to_record(&self, entry: &RawEntry, year: Option<i32>) -> NormalizedRecord {
        let info = entry.info();
        NormalizedRecord {
            id: if self.options.include_id { info.id } else { None },
            artist: join_artists(info.artists.as_deref().unwrap_or_default()),
            album: info.title().to_string(),
            genre: if self.options.include_genre {
                Some(join_genres(info.genres.as_deref().unwrap_or_default()))
            } else {
                None
            },
            year,
            purchasing: if self.options.include_purchasing {
                Some(is_purchasing(entry.notes.as_ref(), &self.options.purchasing_marker))
            } else {
                None
            },
        }
    }
}

/// Non-empty artist names joined with ", "
pub fn join_artists(artists: &[ArtistRef]) -> String {
    artists
        .iter()
        .filter_map(|a| a.name.as_deref())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Non-empty genres joined with ", "
pub fn join_genres(genres: &[Option<String>]) -> String {
    genres
        .iter()
        .filter_map(|g| g.as_deref())
        .filter(|g| !g.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Notes as text: strings verbatim, other JSON values in their printed form, null as empty
pub fn notes_text(notes: Option<&Value>) -> String {
    match notes {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn is_purchasing(notes: Option<&Value>, marker: &str) -> bool {
    notes_text(notes).to_lowercase().contains(marker)
}

/// Stable sort by lowercased (artist, album)
pub fn sort_records(records: &mut [NormalizedRecord]) {
    records.sort_by_cached_key(NormalizedRecord::sort_key);
}
