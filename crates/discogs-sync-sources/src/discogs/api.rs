use discogs_sync_models::RawEntry;
use serde_json::Value;
use tracing::warn;
use crate::error::DiscogsError;

/// One decoded page of a paginated list endpoint
#[derive(Debug)]
pub struct PageEnvelope {
    /// `pagination.pages`, when the page carried pagination metadata
    pub pages: Option<u32>,
    pub items: Vec<RawEntry>,
}

impl PageEnvelope {
    /// Decode a page body, taking entries from the array under `items_key`.
    /// A missing or null array counts as an empty page; entries that are not
    /// JSON objects are skipped with a warning.
    pub fn parse(body: &str, items_key: &str) -> Result<Self, DiscogsError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| DiscogsError::decode(format!("{} page", items_key), e))?;

        let pages = value
            .get("pagination")
            .and_then(|p| p.get("pages"))
            .and_then(Value::as_u64)
            .map(|p| u32::try_from(p).unwrap_or(u32::MAX));

        let items = match value.get(items_key) {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| match serde_json::from_value::<RawEntry>(entry.clone()) {
                    Ok(raw) => Some(raw),
                    Err(e) => {
                        warn!("Skipping malformed {} entry: {}", items_key, e);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self { pages, items })
    }
}

/// Year of a master release; 0, null or a non-integer means unknown
pub fn parse_master_year(body: &str) -> Result<Option<i32>, DiscogsError> {
    let value: Value = serde_json::from_str(body).map_err(|e| DiscogsError::decode("master release", e))?;
    Ok(value
        .get("year")
        .and_then(Value::as_i64)
        .filter(|year| *year != 0)
        .and_then(|year| i32::try_from(year).ok()))
}
