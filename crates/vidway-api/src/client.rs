//! HTTP implementation of the video data API boundary.

use reqwest::{Client, StatusCode};
use serde_json::Value;

use async_trait::async_trait;
use vidway_core::api::{ApiError, ApiParams, VideoDataApi};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Quota units charged for one call to `endpoint`.
///
/// Search is two orders of magnitude more expensive than the list
/// endpoints; unknown endpoints are charged the list rate.
pub fn endpoint_cost(endpoint: &str) -> u64 {
    match endpoint {
        "search" => 100,
        "videos" | "channels" | "commentThreads" | "playlistItems" => 1,
        _ => 1,
    }
}

/// A `reqwest`-based client for the remote video data API.
///
/// Performs exactly one HTTP request per `fetch` call; retrying, caching,
/// and rate limiting all happen above this boundary.
pub struct HttpVideoApi {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpVideoApi {
    /// Creates a client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the base URL (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl VideoDataApi for HttpVideoApi {
    async fn fetch(&self, endpoint: &str, params: &ApiParams) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|err| {
                if err.is_connect() || err.is_timeout() {
                    ApiError::transient(format!("request to {endpoint} failed: {err}"))
                } else {
                    ApiError::permanent(format!("request to {endpoint} failed: {err}"))
                }
            })?;

        let status = response.status();
        tracing::debug!(endpoint, status = status.as_u16(), "api response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|err| ApiError::permanent(format!("malformed response body: {err}")))
    }

    fn cost(&self, endpoint: &str) -> u64 {
        endpoint_cost(endpoint)
    }
}

/// Maps a non-success HTTP status to the boundary error classification.
///
/// 5xx and 429 are transient; client errors are permanent. The body's error
/// message is included when the remote sends a structured error document.
pub fn classify_status(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    let detail = format!("{} ({})", message, status.as_u16());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        ApiError::transient(detail)
    } else {
        ApiError::permanent(detail)
    }
}
