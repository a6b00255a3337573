use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{ApiError, Result};
use crate::http_client::HttpClient;

/// JSON client for the backend API
/// Auth and retries come from the wrapped `HttpClient`
#[derive(Clone)]
pub struct ApiClient {
    client: Arc<dyn HttpClient>,
}

impl ApiClient {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Send `payload` as JSON and return the raw response body
    pub async fn make_request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        payload: &T,
    ) -> Result<Bytes> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("error marshalling payload: {}", e)))?;

        tracing::debug!(
            url = %url,
            payload = %String::from_utf8_lossy(&body),
            "Sending API request"
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        self.client.fetch(method, url, headers, Some(body)).await
    }
}
