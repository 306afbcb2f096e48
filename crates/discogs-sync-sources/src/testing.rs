//! Scripted in-memory transport. Responses are queued per URL (query string
//! included) and every request is recorded so tests can count network calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use crate::error::DiscogsError;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
    failures: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url` (as produced by `ApiRequest::display_url`)
    pub fn respond(&self, url: &str, response: ApiResponse) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Make every request to `url` fail at the transport level
    pub fn fail(&self, url: &str, message: &str) -> &Self {
        self.failures.lock().unwrap().insert(url.to_string(), message.to_string());
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of requests whose URL (without query) starts with `prefix`
    pub fn count_matching(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, DiscogsError> {
        self.requests.lock().unwrap().push(request.clone());
        let key = request.display_url();

        if let Some(message) = self.failures.lock().unwrap().get(&key) {
            return Err(DiscogsError::Transport(message.clone()));
        }

        self.responses
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .ok_or_else(|| DiscogsError::Transport(format!("no scripted response for {}", key)))
    }
}
