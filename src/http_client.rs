use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, Url};
use std::time::Duration;

use crate::auth::AuthConfig;
use crate::config::HttpSettings;
use crate::error::{ApiError, Result};

/// Minimal HTTP interface used by the token fetcher and the API client
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and return the body of a 2xx response
    async fn fetch(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes>;
}

/// Whether a failed attempt should be retried
///
/// Transport failures always are. Otherwise only 408, 429 and 5xx.
pub fn is_retryable(transport_failed: bool, status: u16) -> bool {
    if transport_failed {
        return true;
    }
    matches!(status, 408 | 429 | 500..=599)
}

/// Delay before retry number `attempt + 1`
///
/// `base * 2^attempt` plus up to 25% random jitter.
pub fn exponential_backoff(attempt: u32, base: Duration) -> Duration {
    let delay = base.saturating_mul(2u32.saturating_pow(attempt.min(31)));
    let jitter = delay.mul_f64(rand::thread_rng().gen_range(0.0..0.25));
    delay + jitter
}

/// What made the most recent attempt fail
#[derive(Debug)]
enum LastFailure {
    Transport(String),
    Status(u16),
}

impl std::fmt::Display for LastFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LastFailure::Transport(e) => write!(f, "transport error: {}", e),
            LastFailure::Status(status) => write!(f, "retryable status: {}", status),
        }
    }
}

/// HTTP client with auth header injection and retry logic
#[derive(Clone)]
pub struct RetryHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Authentication for outbound requests, if any
    auth: Option<AuthConfig>,

    /// Maximum number of retries after the first attempt
    max_retries: u32,

    /// Base delay for exponential backoff
    base_delay: Duration,
}

impl RetryHttpClient {
    /// Create a new HTTP client without authentication
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth: None,
            max_retries: settings.max_retries,
            base_delay: settings.base_delay,
        })
    }

    /// Same connection pool and retry policy, with authentication attached
    pub fn with_auth(&self, auth: AuthConfig) -> Self {
        Self {
            auth: Some(auth),
            ..self.clone()
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Execute one attempt and classify the outcome
    async fn attempt(
        &self,
        method: &Method,
        url: &Url,
        headers: HeaderMap,
        body: Option<&[u8]>,
    ) -> Result<Bytes> {
        let mut builder = self.client.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await.map_err(|e| {
            let error_kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connection_failed"
            } else if e.is_request() {
                "request_error"
            } else {
                "unknown"
            };
            tracing::warn!(error_kind = error_kind, error = %e, url = %url, "HTTP request error");
            ApiError::TransportError(format!("{} ({})", e, error_kind))
        })?;

        let status = response.status();
        tracing::debug!(status = %status, "Received HTTP response");

        if status.is_success() {
            return response
                .bytes()
                .await
                .map_err(|e| ApiError::TransportError(format!("error reading body: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        if is_retryable(false, status.as_u16()) {
            tracing::warn!(status = status.as_u16(), url = %url, "Received retryable status");
            Err(ApiError::RetryableStatus {
                status: status.as_u16(),
                body,
            })
        } else {
            tracing::error!(
                status = status.as_u16(),
                url = %url,
                response_body = %body,
                "HTTP request failed with error response"
            );
            Err(ApiError::FatalStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl HttpClient for RetryHttpClient {
    async fn fetch(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes> {
        let url = Url::parse(url)
            .map_err(|e| ApiError::ValidationError(format!("invalid URL {}: {}", url, e)))?;
        let total_attempts = self.max_retries + 1;

        tracing::debug!(method = %method, url = %url, "Sending HTTP request");

        let mut last_failure: Option<LastFailure> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = exponential_backoff(attempt - 1, self.base_delay);
                tracing::debug!(
                    "Retrying request to {} (attempt {}/{}) after {}ms",
                    url,
                    attempt + 1,
                    total_attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request_headers = headers.clone();
            if let Some(auth) = &self.auth {
                if !request_headers.contains_key(AUTHORIZATION) {
                    // Auth failures are final: no retry, no extra attempt
                    let value = auth.authorization_header().await.map_err(|e| match e {
                        ApiError::AuthError(_) => e,
                        other => ApiError::AuthError(other.to_string()),
                    })?;
                    let value = HeaderValue::from_str(&value).map_err(|_| {
                        ApiError::AuthError(
                            "authorization header contains invalid characters".to_string(),
                        )
                    })?;
                    request_headers.insert(AUTHORIZATION, value);
                }
            }

            match self
                .attempt(&method, &url, request_headers, body.as_deref())
                .await
            {
                Ok(bytes) => {
                    tracing::debug!(attempt = attempt + 1, "Request successful");
                    return Ok(bytes);
                }
                Err(ApiError::TransportError(e)) => {
                    last_failure = Some(LastFailure::Transport(e));
                }
                Err(ApiError::RetryableStatus { status, .. }) => {
                    last_failure = Some(LastFailure::Status(status));
                }
                Err(e) => return Err(e),
            }
        }

        let cause = last_failure
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        tracing::error!(
            url = %url,
            total_attempts = total_attempts,
            cause = %cause,
            "HTTP request failed after all retries"
        );
        Err(ApiError::RetriesExhausted {
            attempts: total_attempts,
            cause,
        })
    }
}
