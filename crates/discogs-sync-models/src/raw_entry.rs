use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entry of a collection or wantlist page, as returned by Discogs.
///
/// Everything is optional: the API omits or nulls fields freely, and
/// a malformed field should degrade to a default rather than abort the sync.
/// `year`, `master_id` and `notes` stay as raw JSON values so their type can
/// be inspected during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub basic_information: Option<BasicInformation>,
    #[serde(default)]
    pub notes: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BasicInformation {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub artists: Option<Vec<ArtistRef>>,
    #[serde(default)]
    pub year: Option<Value>,
    #[serde(default)]
    pub master_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub genres: Option<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtistRef {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// A value of the wrong shape reads as absent instead of failing the whole entry
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Release ids are integers, but numeric strings are accepted too
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A list where every non-string element becomes `None`
fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<Option<String>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

static EMPTY_INFO: BasicInformation = BasicInformation {
    id: None,
    title: None,
    artists: None,
    year: None,
    master_id: None,
    genres: None,
};

impl RawEntry {
    pub fn info(&self) -> &BasicInformation {
        self.basic_information.as_ref().unwrap_or(&EMPTY_INFO)
    }
}

impl BasicInformation {
    /// The release's own year. Discogs reports unknown years as 0, which counts as absent.
    pub fn release_year(&self) -> Option<i32> {
        self.year
            .as_ref()
            .and_then(Value::as_i64)
            .filter(|year| *year != 0)
            .and_then(|year| i32::try_from(year).ok())
    }

    /// The master id, only when it is a JSON integer
    pub fn master_id(&self) -> Option<i64> {
        match self.master_id.as_ref()? {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}
