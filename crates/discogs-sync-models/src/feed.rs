use serde::{Deserialize, Serialize};
use std::fmt;

/// The two user lists that get mirrored to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Collection,
    Wantlist,
}

impl FeedKind {
    pub fn all() -> [FeedKind; 2] {
        [FeedKind::Collection, FeedKind::Wantlist]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeedKind::Collection => "collection",
            FeedKind::Wantlist => "wantlist",
        }
    }

    /// Key of the array holding the entries in each page of the list endpoint
    pub fn items_key(&self) -> &'static str {
        match self {
            FeedKind::Collection => "releases",
            FeedKind::Wantlist => "wants",
        }
    }

    /// Path of the list endpoint relative to the API base, for an already url-encoded username
    pub fn endpoint_path(&self, encoded_username: &str) -> String {
        match self {
            FeedKind::Collection => format!("/users/{}/collection/folders/0/releases", encoded_username),
            FeedKind::Wantlist => format!("/users/{}/wants", encoded_username),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }

    /// Only wantlist entries carry user notes worth scanning for a purchase marker
    pub fn carries_notes(&self) -> bool {
        matches!(self, FeedKind::Wantlist)
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
