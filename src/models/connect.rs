use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Amazon Connect Lambda invocation event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectEvent {
    #[serde(rename = "Details", default)]
    pub details: ConnectDetails,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectDetails {
    /// Contact attributes, kept as raw JSON so they can be forwarded untouched
    #[serde(rename = "ContactData", default)]
    pub contact_data: Map<String, Value>,

    /// Flow-supplied parameters
    #[serde(rename = "Parameters", default)]
    pub parameters: HashMap<String, String>,
}

impl ConnectEvent {
    /// `ContactData.ContactId`, or empty if absent
    pub fn contact_id(&self) -> &str {
        self.details
            .contact_data
            .get("ContactId")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Non-empty parameter value
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.details
            .parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Flat key/value response handed back to the contact flow
pub type ConnectResponse = Map<String, Value>;
