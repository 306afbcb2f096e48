use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscogsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP transport failed: {0}")]
    Transport(String),

    #[error("Discogs API error on page {page}: {status} {body}")]
    Api { page: u32, status: u16, body: String },

    #[error("We are hitting Discogs API rate limits ({url}, gave up after {attempts} attempt(s))")]
    RateLimited { url: String, attempts: u32 },

    #[error("Master {master_id} lookup failed with status {status}")]
    MasterLookupFailed { master_id: i64, status: u16 },

    #[error("Failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DiscogsError {
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        DiscogsError::Decode {
            context: context.into(),
            source,
        }
    }
}
