use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;
use crate::error::DiscogsError;

/// A single GET against the Discogs API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// URL with the query string appended, used for logging and error messages
    pub fn display_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}?{}", self.url, query.join("&"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Seconds from the Retry-After header, when the server sent one
    pub retry_after: Option<u64>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn ok_json(body: &serde_json::Value) -> Self {
        Self::new(200, body.to_string())
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// The only network seam: production uses reqwest, tests use a scripted transport
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, DiscogsError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, DiscogsError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, DiscogsError> {
        let mut builder = self.client.get(&request.url).query(&request.query);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse().ok());
        let body = response.text().await?;

        trace!(url = %request.display_url(), status, bytes = body.len(), "Discogs response");
        Ok(ApiResponse { status, retry_after, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_url() {
        let request = ApiRequest::get("https://api.discogs.com/users/x/wants")
            .query("per_page", 100)
            .query("page", 2);
        assert_eq!(
            request.display_url(),
            "https://api.discogs.com/users/x/wants?per_page=100&page=2"
        );
        assert_eq!(ApiRequest::get("https://a/b").display_url(), "https://a/b");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = ApiRequest::get("https://a/b").header("User-Agent", "discogs-sync/0.1.0");
        assert_eq!(request.header_value("user-agent"), Some("discogs-sync/0.1.0"));
        assert_eq!(request.header_value("Authorization"), None);
    }

    #[test]
    fn test_response_status_helpers() {
        assert!(ApiResponse::new(200, "{}").is_success());
        assert!(!ApiResponse::new(404, "").is_success());
        let limited = ApiResponse::new(429, "").with_retry_after(3);
        assert!(limited.is_rate_limited());
        assert_eq!(limited.retry_after, Some(3));
    }
}
