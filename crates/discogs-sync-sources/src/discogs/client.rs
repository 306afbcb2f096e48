use discogs_sync_config::{DiscogsConfig, DiscogsCredentials, RateLimitPolicy};
use discogs_sync_models::{FeedKind, RawEntry};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use crate::discogs::api::{parse_master_year, PageEnvelope};
use crate::error::DiscogsError;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

/// Discogs API client. Requests go out one at a time, each awaited before the next.
#[derive(Clone)]
pub struct DiscogsClient {
    transport: Arc<dyn HttpTransport>,
    credentials: DiscogsCredentials,
    base_url: String,
    user_agent: String,
    per_page: u32,
    rate_limit: RateLimitPolicy,
}

impl DiscogsClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: DiscogsCredentials,
        config: &DiscogsConfig,
    ) -> Self {
        Self {
            transport,
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            per_page: config.per_page,
            rate_limit: config.rate_limit.clone(),
        }
    }

    /// Client backed by reqwest with the configured timeout
    pub fn from_config(credentials: DiscogsCredentials, config: &DiscogsConfig) -> Result<Self, DiscogsError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::new(Arc::new(transport), credentials, config))
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn feed_url(&self, feed: FeedKind) -> String {
        let encoded_username = urlencoding::encode(&self.credentials.username);
        format!("{}{}", self.base_url, feed.endpoint_path(&encoded_username))
    }

    pub fn master_url(&self, master_id: i64) -> String {
        format!("{}/masters/{}", self.base_url, master_id)
    }

    fn request(&self, url: &str) -> ApiRequest {
        ApiRequest::get(url)
            .header("User-Agent", self.user_agent.clone())
            .header("Authorization", self.credentials.authorization())
    }

    /// Send a request, applying the rate-limit policy to 429 answers.
    /// Every other status is returned to the caller untouched.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, DiscogsError> {
        let mut attempt: u32 = 0;
        loop {
            let response = self.transport.get(request).await?;
            if !response.is_rate_limited() {
                return Ok(response);
            }

            match self.rate_limit.retry_delay(attempt, response.retry_after) {
                Some(delay) => {
                    warn!(
                        url = %request.display_url(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Discogs rate limit hit, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    return Err(DiscogsError::RateLimited {
                        url: request.display_url(),
                        attempts: attempt + 1,
                    });
                }
            }
        }
    }

    /// Walk a paginated list endpoint and return every entry under `items_key`, in page order.
    ///
    /// The page count comes from the first page's `pagination.pages` (1 when absent).
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, url: &str, items_key: &str) -> Result<Vec<RawEntry>, DiscogsError> {
        let mut page: u32 = 1;
        let mut pages_total: u32 = 1;
        let mut items = Vec::new();

        while page <= pages_total {
            let request = self
                .request(url)
                .query("per_page", self.per_page)
                .query("page", page);
            let response = self.send(&request).await?;

            if !response.is_success() {
                warn!("Discogs API error: {} - {}. URL: {}", response.status, response.body, request.display_url());
                return Err(DiscogsError::Api {
                    page,
                    status: response.status,
                    body: response.body,
                });
            }

            let envelope = PageEnvelope::parse(&response.body, items_key)?;
            if page == 1 {
                if let Some(pages) = envelope.pages {
                    pages_total = pages;
                }
            }

            debug!(
                "Discogs {}: page={}, total_pages={}, items_on_page={}",
                items_key,
                page,
                pages_total,
                envelope.items.len()
            );
            items.extend(envelope.items);
            page += 1;
        }

        info!("Fetched {} {} across {} page(s)", items.len(), items_key, pages_total.max(1));
        Ok(items)
    }

    pub async fn fetch_feed(&self, feed: FeedKind) -> Result<Vec<RawEntry>, DiscogsError> {
        let url = self.feed_url(feed);
        self.fetch_all(&url, feed.items_key()).await
    }

    /// Look up the year of a master release.
    ///
    /// Any non-success answer (including an exhausted rate limit) is reported as
    /// `MasterLookupFailed`; transport failures propagate as they are.
    pub async fn get_master_year(&self, master_id: i64) -> Result<Option<i32>, DiscogsError> {
        let request = self.request(&self.master_url(master_id));
        let response = match self.send(&request).await {
            Ok(response) => response,
            Err(DiscogsError::RateLimited { .. }) => {
                return Err(DiscogsError::MasterLookupFailed { master_id, status: 429 });
            }
            Err(e) => return Err(e),
        };

        if !response.is_success() {
            return Err(DiscogsError::MasterLookupFailed {
                master_id,
                status: response.status,
            });
        }

        parse_master_year(&response.body)
    }
}
