use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ==================================================================================================
// Request Models
// ==================================================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PstnTransferRequest {
    pub call_id: String,
    pub ccaas_metadata: Map<String, Value>,
    pub supported_dtmf_chars: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchHandoffRequest {
    pub correlation_id: String,
}

// ==================================================================================================
// Response Models
// ==================================================================================================

/// fetchAIAgentHandoff response
#[derive(Debug, Clone, Deserialize)]
pub struct FetchHandoffResponse {
    pub handoff: Handoff,
}

/// Handoff details
/// metadataByTaxonomy is not needed and is ignored
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handoff {
    pub conversation: String,
    pub conversation_correlation_id: String,
    pub summary: String,
    pub transfer_target: String,
}
