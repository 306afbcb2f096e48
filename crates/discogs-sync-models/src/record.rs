use serde::{Deserialize, Serialize};

/// Flat, output-ready view of one release.
///
/// `id`, `genre` and `purchasing` are left out of the JSON when the
/// corresponding normalizer option is off (purchasing only exists for wantlist items).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub artist: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchasing: Option<bool>,
}

impl NormalizedRecord {
    /// Case-insensitive (artist, album) key used for output ordering
    pub fn sort_key(&self) -> (String, String) {
        (self.artist.to_lowercase(), self.album.to_lowercase())
    }
}
