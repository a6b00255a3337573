use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;

use super::cache::TokenCache;
use super::types::{TokenRequest, TokenResponse};
use crate::error::{ApiError, Result};
use crate::http_client::HttpClient;

/// Path of the regional token endpoint, appended to the auth domain
pub const TOKEN_PATH: &str = "/v1/oauth/regionalToken";

/// Source of OAuth 2 access tokens
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    /// Get an access token for the given client, failing with `ApiError::AuthError`
    async fn get_token(
        &self,
        auth_domain: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String>;
}

/// Client credentials token fetcher
/// Consults the shared cache first and only calls the token endpoint on a miss
pub struct DefaultTokenFetcher {
    /// HTTP client for token requests (no auth attached)
    client: Arc<dyn HttpClient>,

    /// Shared token cache
    cache: Arc<TokenCache>,
}

impl DefaultTokenFetcher {
    pub fn new(client: Arc<dyn HttpClient>, cache: Arc<TokenCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }
}

/// Build a `Basic` authorization value from client credentials
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let encoded = STANDARD.encode(format!("{}:{}", client_id, client_secret));
    format!("Basic {}", encoded)
}

#[async_trait]
impl TokenFetcher for DefaultTokenFetcher {
    async fn get_token(
        &self,
        auth_domain: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String> {
        if let Some(token) = self.cache.get(client_id) {
            tracing::debug!("Using cached access token");
            return Ok(token);
        }

        let token_url = format!("{}{}", auth_domain.trim_end_matches('/'), TOKEN_PATH);
        tracing::debug!(url = %token_url, "Requesting access token");

        let body = serde_json::to_vec(&TokenRequest::default())
            .map_err(|e| ApiError::AuthError(format!("error marshalling payload: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let basic = HeaderValue::from_str(&basic_auth_header(client_id, client_secret))
            .map_err(|_| {
                ApiError::AuthError("client credentials contain invalid characters".to_string())
            })?;
        headers.insert(AUTHORIZATION, basic);

        let response = self
            .client
            .fetch(Method::POST, &token_url, headers, Some(body))
            .await
            .map_err(|e| match e {
                ApiError::AuthError(_) => e,
                ApiError::FatalStatus { status, body } => ApiError::AuthError(format!(
                    "token request returned non-2xx status: {}, body: {}",
                    status, body
                )),
                other => ApiError::AuthError(format!("token request failed: {}", other)),
            })?;

        let data: TokenResponse = serde_json::from_slice(&response)
            .map_err(|e| ApiError::AuthError(format!("error parsing token response: {}", e)))?;

        let access_token = match data.access_token {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(ApiError::AuthError(
                    "missing access_token in token response".to_string(),
                ))
            }
        };

        match data.expires_in {
            Some(expires_in) if expires_in > 0 => {
                self.cache.set(client_id, &access_token, expires_in);
            }
            other => {
                tracing::warn!(
                    expires_in = ?other,
                    "Token response has no usable expires_in, token will not be cached"
                );
            }
        }

        tracing::info!("Access token fetched");
        Ok(access_token)
    }
}
