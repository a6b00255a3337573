// Authentication types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::fetcher::TokenFetcher;
use crate::error::{ApiError, Result};

/// How outbound API requests are authenticated
#[derive(Clone)]
pub enum AuthConfig {
    /// OAuth 2 client credentials, exchanged for a bearer token
    OAuth2 {
        auth_domain: String,
        client_id: String,
        client_secret: String,
        token_fetcher: Arc<dyn TokenFetcher>,
    },

    /// Static API key
    /// Deprecated in favour of OAuth 2
    ApiKey(String),
}

impl AuthConfig {
    /// Pick an auth mode from whatever credentials are available
    ///
    /// OAuth 2 wins when both a client id/secret pair and an API key are set.
    pub fn from_credentials(
        auth_domain: &str,
        client_id: &str,
        client_secret: &str,
        api_key: &str,
        token_fetcher: Arc<dyn TokenFetcher>,
    ) -> Option<Self> {
        if !client_id.is_empty() && !client_secret.is_empty() {
            Some(AuthConfig::OAuth2 {
                auth_domain: auth_domain.to_string(),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                token_fetcher,
            })
        } else if !api_key.is_empty() {
            Some(AuthConfig::ApiKey(api_key.to_string()))
        } else {
            None
        }
    }

    /// Resolve the `Authorization` header value for one request attempt
    pub async fn authorization_header(&self) -> Result<String> {
        match self {
            AuthConfig::OAuth2 {
                auth_domain,
                client_id,
                client_secret,
                token_fetcher,
            } => {
                if auth_domain.is_empty() {
                    return Err(ApiError::AuthError(
                        "authDomain is required for OAuth authentication".to_string(),
                    ));
                }
                let token = token_fetcher
                    .get_token(auth_domain, client_id, client_secret)
                    .await?;
                Ok(format!("Bearer {}", token))
            }
            AuthConfig::ApiKey(key) => Ok(format!("ApiKey {}", key)),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::OAuth2 {
                auth_domain,
                client_id,
                ..
            } => f
                .debug_struct("OAuth2")
                .field("auth_domain", auth_domain)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            AuthConfig::ApiKey(_) => f.write_str("ApiKey(..)"),
        }
    }
}

/// Client credentials grant request body
#[derive(Serialize)]
pub struct TokenRequest {
    pub grant_type: &'static str,
}

impl Default for TokenRequest {
    fn default() -> Self {
        Self {
            grant_type: "client_credentials",
        }
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// OAuth client credentials loaded from a secret
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("oauth_client_id", &self.oauth_client_id)
            .field("oauth_client_secret", &"<redacted>")
            .finish()
    }
}
