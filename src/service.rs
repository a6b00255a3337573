// Per-invocation orchestration: resolve settings, pick auth, dispatch the action

use std::sync::Arc;

use crate::auth::{AuthConfig, SecretStore, TokenFetcher};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::handlers::{Action, Handlers};
use crate::http_client::RetryHttpClient;
use crate::models::{ConnectEvent, ConnectResponse};
use crate::resolver::{
    build_api_domain_from_region, build_auth_domain_from_region, extract_region_from_domain,
    normalize_domain, validate_domain, VirtualAgentName,
};

/// Shared dependencies for handling Connect invocations
///
/// Built once per process; the token cache behind `token_fetcher` and the
/// connection pool behind `http` outlive individual invocations.
#[derive(Clone)]
pub struct HandlerService {
    config: Arc<Config>,
    http: RetryHttpClient,
    token_fetcher: Arc<dyn TokenFetcher>,
    secret_store: Arc<dyn SecretStore>,
}

impl HandlerService {
    pub fn new(
        config: Arc<Config>,
        http: RetryHttpClient,
        token_fetcher: Arc<dyn TokenFetcher>,
        secret_store: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            config,
            http,
            token_fetcher,
            secret_store,
        }
    }

    /// Event parameter, falling back to the environment variable of the same name
    fn param<'a>(&'a self, event: &'a ConnectEvent, key: &str) -> Option<&'a str> {
        event.parameter(key).or_else(|| self.config.env.get(key))
    }

    pub async fn handle(&self, event: &ConnectEvent) -> Result<ConnectResponse> {
        tracing::debug!(contact_id = %event.contact_id(), "Received event");

        let region_param = self.param(event, "region");
        let api_domain_param = self.param(event, "apiDomain");
        let auth_domain_param = self.param(event, "authDomain");
        let secret_arn = self.param(event, "oauthSecretArn");
        let client_id = self.param(event, "oauthClientId");
        let client_secret = self.param(event, "oauthClientSecret");

        // A custom API domain needs a matching custom auth domain when OAuth is used
        let will_use_oauth = secret_arn.is_some() || (client_id.is_some() && client_secret.is_some());
        if will_use_oauth && api_domain_param.is_some() != auth_domain_param.is_some() {
            return Err(ApiError::ValidationError(
                "apiDomain and authDomain must be provided together".to_string(),
            ));
        }

        let region = match (region_param, api_domain_param) {
            (Some(region), _) => region.to_string(),
            (None, Some(api_domain)) => extract_region_from_domain(api_domain).map_err(|e| {
                ApiError::ValidationError(format!(
                    "could not extract region from apiDomain: {}",
                    e
                ))
            })?,
            (None, None) => {
                return Err(ApiError::ValidationError("region is required".to_string()))
            }
        };

        let domain = match api_domain_param {
            Some(api_domain) => normalize_domain(api_domain),
            None => build_api_domain_from_region(&region)?,
        };
        validate_domain(&domain)
            .map_err(|e| ApiError::ValidationError(format!("invalid domain: {}", e)))?;

        let auth_domain = match auth_domain_param {
            Some(auth_domain) => {
                let auth_domain = normalize_domain(auth_domain);
                validate_domain(&auth_domain)
                    .map_err(|e| ApiError::ValidationError(format!("invalid authDomain: {}", e)))?;
                Some(auth_domain)
            }
            None => None,
        };

        let action = self
            .param(event, "action")
            .ok_or_else(|| ApiError::ValidationError("action is required".to_string()))?;
        let action = Action::parse(action)?;

        let virtual_agent_name = self
            .param(event, "virtualAgentName")
            .ok_or_else(|| ApiError::ValidationError("virtualAgentName is required".to_string()))?;
        let agent = VirtualAgentName::parse(virtual_agent_name).map_err(|e| {
            tracing::error!(error = %e, "Error parsing virtual agent name");
            e
        })?;

        let auth = self
            .resolve_auth(event, &region, auth_domain, client_id, client_secret, secret_arn)
            .await?;

        tracing::info!(
            domain = %domain,
            region = %region,
            action = ?action,
            virtual_agent_name = %virtual_agent_name,
            "Dispatching action"
        );

        let api_client = ApiClient::new(Arc::new(self.http.with_auth(auth)));
        let handlers = Handlers::new(
            api_client,
            &domain,
            agent,
            &self.config.supported_dtmf_chars,
            &self.config.version,
            event,
        );
        handlers.dispatch(action).await
    }

    /// Credentials in priority order: secret store, client id/secret, API key
    async fn resolve_auth(
        &self,
        event: &ConnectEvent,
        region: &str,
        auth_domain: Option<String>,
        client_id: Option<&str>,
        client_secret: Option<&str>,
        secret_arn: Option<&str>,
    ) -> Result<AuthConfig> {
        let (client_id, client_secret) = match secret_arn {
            Some(arn) => {
                tracing::info!(secret_arn = %arn, "Fetching OAuth credentials from Secrets Manager");
                let credentials = self
                    .secret_store
                    .get_oauth_credentials(arn)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "Failed to retrieve credentials from Secrets Manager");
                        let cause = match e {
                            ApiError::AuthError(msg) => msg,
                            other => other.to_string(),
                        };
                        ApiError::AuthError(format!(
                            "failed to retrieve OAuth credentials from Secrets Manager: {}",
                            cause
                        ))
                    })?;
                (credentials.oauth_client_id, credentials.oauth_client_secret)
            }
            None => (
                client_id.unwrap_or_default().to_string(),
                client_secret.unwrap_or_default().to_string(),
            ),
        };

        let auth_domain =
            auth_domain.unwrap_or_else(|| build_auth_domain_from_region(region));
        let api_key = self.param(event, "apiKey").unwrap_or_default();

        let auth = AuthConfig::from_credentials(
            &auth_domain,
            &client_id,
            &client_secret,
            api_key,
            self.token_fetcher.clone(),
        )
        .ok_or_else(|| {
            ApiError::ValidationError(
                "either apiKey (deprecated), oauthClientId/oauthClientSecret, or oauthSecretArn must be provided"
                    .to_string(),
            )
        })?;

        match &auth {
            AuthConfig::OAuth2 { auth_domain, .. } => {
                tracing::info!(auth_domain = %auth_domain, "Using OAuth 2 authentication")
            }
            AuthConfig::ApiKey(_) => {
                tracing::warn!("Using API key authentication (deprecated)")
            }
        }
        Ok(auth)
    }
}
