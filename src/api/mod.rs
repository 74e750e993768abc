//! HTTP client for the workspace API.
//!
//! All requests are sequential; sibling calls are never fanned out, which
//! keeps the hosted API's per-key rate limits respected. Transient failures
//! (429 and 5xx) retry with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{PagelinkError, Result};

/// Typed HTTP verbs against the workspace API, returning decoded JSON.
///
/// Components take an implementation as an explicit constructor dependency,
/// never as ambient state, so the resolver and traversal engine can run
/// against an in-memory substitute in tests.
#[async_trait]
pub trait Remote: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;
    async fn post(&self, path: &str, body: Value) -> Result<Value>;
    async fn patch(&self, path: &str, body: Value) -> Result<Value>;
}

#[async_trait]
impl<T: Remote + ?Sized> Remote for &T {
    async fn get(&self, path: &str) -> Result<Value> {
        (**self).get(path).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        (**self).post(path, body).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value> {
        (**self).patch(path, body).await
    }
}

/// Production client over reqwest.
///
/// Carries the bearer token, a request timeout, and a bounded retry budget
/// for rate-limit and transient server errors.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: String,
    max_retries: usize,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the workspace API, e.g. `https://api.example.com/v1/`
    /// * `token` - Bearer token for the integration
    /// * `timeout_secs` - Per-request timeout
    /// * `max_retries` - Retry budget for 429/5xx responses
    pub fn new(base_url: &str, token: String, timeout_secs: u64, max_retries: usize) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| PagelinkError::Config(format!("Invalid base_url '{}': {}", base_url, e)))?;
        // Joining relative paths requires a trailing slash on the base
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(PagelinkError::Transport)?;

        Ok(Self {
            client,
            base_url,
            token,
            max_retries,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PagelinkError::Config(format!("Invalid request path '{}': {}", path, e)))
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.endpoint(path)?;
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            let started = std::time::Instant::now();
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header("Authorization", format!("Bearer {}", self.token));
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(PagelinkError::Transport)?;
            let status = response.status();
            log::debug!(
                "{} {} -> {} in {:?} (attempt {})",
                method,
                path,
                status.as_u16(),
                started.elapsed(),
                attempt + 1
            );

            if status.is_success() {
                return response.json::<Value>().await.map_err(PagelinkError::Transport);
            }

            let message = read_error_message(response).await;
            if should_retry(status) && attempt < self.max_retries {
                attempt += 1;
                log::warn!(
                    "Retry {}/{} after {} on {} {}: {}",
                    attempt,
                    self.max_retries,
                    status.as_u16(),
                    method,
                    path,
                    message
                );
                tokio::time::sleep(delay).await;
                delay *= 2; // Exponential backoff
                continue;
            }

            return Err(classify(status, path, message));
        }
    }
}

#[async_trait]
impl Remote for ApiClient {
    async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.request(Method::POST, path, Some(&body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value> {
        self.request(Method::PATCH, path, Some(&body)).await
    }
}

/// Retryable statuses: rate limiting and transient server errors.
fn should_retry(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Map a non-success response onto the error taxonomy. A 404 means the id in
/// the path did not resolve; everything else stays a classified API error.
fn classify(status: StatusCode, path: &str, message: String) -> PagelinkError {
    if status == StatusCode::NOT_FOUND {
        PagelinkError::NotFound(path.to_string())
    } else {
        PagelinkError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

async fn read_error_message(response: reqwest::Response) -> String {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    extract_message(&text).unwrap_or(text)
}

/// Pull the human-readable `message` field out of a JSON error body.
fn extract_message(text: &str) -> Option<String> {
    serde_json::from_str::<Value>(text)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
