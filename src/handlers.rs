// Action handlers: build backend requests and shape responses for Connect

use reqwest::Method;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::api::{FetchHandoffRequest, FetchHandoffResponse, Handoff, PstnTransferRequest};
use crate::models::{ConnectEvent, ConnectResponse};
use crate::resolver::VirtualAgentName;

/// Parameters consumed by the handler itself and never forwarded to the API
pub const FILTERED_KEYS: &[&str] = &[
    "apiDomain",
    "authDomain",
    "region",
    "action",
    "apiKey",
    "oauthClientId",
    "oauthClientSecret",
    "oauthSecretArn",
    "virtualAgentName",
    "supportedDtmfChars",
];

/// Supported actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetPstnTransferData,
    GetHandoffData,
}

impl Action {
    pub fn parse(action: &str) -> Result<Self> {
        match action {
            "get_pstn_transfer_data" => Ok(Action::GetPstnTransferData),
            "get_handoff_data" => Ok(Action::GetHandoffData),
            other => Err(ApiError::ValidationError(format!(
                "invalid action: {}",
                other
            ))),
        }
    }
}

/// Copy parameters, dropping the handler's own configuration keys
pub fn filter_parameters(parameters: &HashMap<String, String>) -> Map<String, Value> {
    parameters
        .iter()
        .filter(|(k, _)| !FILTERED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

/// Per-invocation handler bound to one domain and virtual agent
pub struct Handlers<'a> {
    api_client: ApiClient,
    domain: String,
    agent: VirtualAgentName,
    supported_dtmf_chars: String,
    version: String,
    event: &'a ConnectEvent,
}

impl<'a> Handlers<'a> {
    pub fn new(
        api_client: ApiClient,
        domain: &str,
        agent: VirtualAgentName,
        supported_dtmf_chars: &str,
        version: &str,
        event: &'a ConnectEvent,
    ) -> Self {
        Self {
            api_client,
            domain: domain.trim_end_matches('/').to_string(),
            agent,
            supported_dtmf_chars: supported_dtmf_chars.to_string(),
            version: version.to_string(),
            event,
        }
    }

    pub async fn dispatch(&self, action: Action) -> Result<ConnectResponse> {
        match action {
            Action::GetPstnTransferData => self.get_pstn_transfer_data().await,
            Action::GetHandoffData => self.get_handoff_data().await,
        }
    }

    /// Get the phone number and DTMF sequence for a PSTN transfer
    pub async fn get_pstn_transfer_data(&self) -> Result<ConnectResponse> {
        let url = format!(
            "{}/v1/{}:generatePSTNTransferData",
            self.domain,
            self.agent.resource_name()
        );

        // Contact data with the forwarded parameters nested under it
        let mut ccaas_metadata = self.event.details.contact_data.clone();
        ccaas_metadata.insert(
            "parameters".to_string(),
            Value::Object(filter_parameters(&self.event.details.parameters)),
        );
        ccaas_metadata.insert("version".to_string(), Value::String(self.version.clone()));

        let payload = PstnTransferRequest {
            call_id: self.event.contact_id().to_string(),
            ccaas_metadata,
            supported_dtmf_chars: self.supported_dtmf_chars.clone(),
        };

        let body = self
            .api_client
            .make_request(Method::POST, &url, &payload)
            .await?;

        let result: Value = serde_json::from_slice(&body).map_err(|e| {
            ApiError::ResponseShapeError(format!(
                "failed to parse JSON response from {}: {}",
                url, e
            ))
        })?;

        match result {
            Value::Object(map) => {
                tracing::debug!(response = ?map, "Received PSTN transfer data");
                Ok(map)
            }
            other => Err(ApiError::ResponseShapeError(format!(
                "expected a JSON object from {}, got: {}",
                url, other
            ))),
        }
    }

    /// Get the AI agent handoff for this contact
    pub async fn get_handoff_data(&self) -> Result<ConnectResponse> {
        let url = format!(
            "{}/v1/customers/{}/profiles/{}/handoffs:fetchAIAgentHandoff",
            self.domain, self.agent.customer, self.agent.profile
        );

        let payload = FetchHandoffRequest {
            correlation_id: self.event.contact_id().to_string(),
        };

        let body = self
            .api_client
            .make_request(Method::POST, &url, &payload)
            .await?;

        let handoff = parse_handoff_response(&body, &url)?;
        tracing::debug!(
            conversation = %handoff.conversation,
            "Received handoff data"
        );

        let mut response = ConnectResponse::new();
        response.insert(
            "handoff_conversation".to_string(),
            Value::String(handoff.conversation),
        );
        response.insert(
            "handoff_conversationCorrelationId".to_string(),
            Value::String(handoff.conversation_correlation_id),
        );
        response.insert(
            "handoff_summary".to_string(),
            Value::String(handoff.summary),
        );
        response.insert(
            "handoff_transferTarget".to_string(),
            Value::String(handoff.transfer_target),
        );
        Ok(response)
    }
}

fn parse_handoff_response(body: &[u8], url: &str) -> Result<Handoff> {
    let parsed: Value = serde_json::from_slice(body).map_err(|e| {
        ApiError::ResponseShapeError(format!(
            "failed to parse JSON response from {}: {}",
            url, e
        ))
    })?;

    if !parsed.get("handoff").is_some_and(Value::is_object) {
        return Err(ApiError::ResponseShapeError(format!(
            "invalid handoff response structure: {}",
            parsed
        )));
    }

    let response: FetchHandoffResponse = serde_json::from_value(parsed).map_err(|_| {
        ApiError::ResponseShapeError(
            "invalid handoff response: missing or invalid required fields (conversation, conversationCorrelationId, summary, transferTarget)"
                .to_string(),
        )
    })?;
    Ok(response.handoff)
}
