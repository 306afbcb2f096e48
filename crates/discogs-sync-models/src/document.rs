use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use crate::record::NormalizedRecord;

/// A snapshot file: when it was produced and what it contains
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputDocument {
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    pub items: Vec<NormalizedRecord>,
}

impl OutputDocument {
    pub fn new(items: Vec<NormalizedRecord>) -> Self {
        Self::stamped(Utc::now(), items)
    }

    pub fn stamped(updated_at: DateTime<Utc>, items: Vec<NormalizedRecord>) -> Self {
        Self { updated_at, items }
    }
}

// e.g. 2026-01-17T09:30:00.123456+00:00
fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Micros, false))
}
