// Credential loading from AWS Secrets Manager

use async_trait::async_trait;
use aws_sdk_secretsmanager::config::Region;
use serde_json::Value;

use super::types::OAuthCredentials;
use crate::error::{ApiError, Result};

/// Source of OAuth client credentials referenced by a secret ARN
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_oauth_credentials(&self, secret_arn: &str) -> Result<OAuthCredentials>;
}

/// Secrets Manager backed store
/// A client is built per lookup because the region comes from the ARN
#[derive(Debug, Default, Clone)]
pub struct SecretsManagerStore;

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_oauth_credentials(&self, secret_arn: &str) -> Result<OAuthCredentials> {
        let region = extract_region_from_secret_arn(secret_arn)?;

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;
        let client = aws_sdk_secretsmanager::Client::new(&sdk_config);

        let output = client
            .get_secret_value()
            .secret_id(secret_arn)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to retrieve secret from Secrets Manager");
                ApiError::AuthError(format!(
                    "failed to retrieve secret from Secrets Manager: {}",
                    e
                ))
            })?;

        let secret_string = output.secret_string().ok_or_else(|| {
            ApiError::AuthError("secret value is empty or not a string".to_string())
        })?;

        let credentials = parse_secret_string(secret_string)?;
        tracing::debug!("Retrieved OAuth credentials from Secrets Manager");
        Ok(credentials)
    }
}

/// Extract the region from `arn:aws:secretsmanager:REGION:ACCOUNT:secret:NAME`
pub fn extract_region_from_secret_arn(arn: &str) -> Result<String> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() < 4
        || parts[0] != "arn"
        || parts[1] != "aws"
        || parts[2] != "secretsmanager"
        || parts[3].is_empty()
    {
        return Err(ApiError::AuthError(format!(
            "invalid Secrets Manager ARN format: {}",
            arn
        )));
    }
    Ok(parts[3].to_string())
}

/// Parse a secret holding `oauthClientId` and `oauthClientSecret`
pub fn parse_secret_string(secret: &str) -> Result<OAuthCredentials> {
    let value: Value = serde_json::from_str(secret)
        .map_err(|e| ApiError::AuthError(format!("failed to parse secret JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| ApiError::AuthError("secret must be a JSON object".to_string()))?;

    let client_id = object.get("oauthClientId").and_then(|v| v.as_str());
    let client_secret = object.get("oauthClientSecret").and_then(|v| v.as_str());

    match (client_id, client_secret) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok(OAuthCredentials {
            oauth_client_id: id.to_string(),
            oauth_client_secret: secret.to_string(),
        }),
        _ => Err(ApiError::AuthError(
            "secret must contain oauthClientId and oauthClientSecret as non-empty strings"
                .to_string(),
        )),
    }
}
