//! Request envelope sent to the helper.

use serde::{Deserialize, Serialize};

/// Request envelope.
///
/// Written as a single JSON object followed by `\n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelperRequest {
    /// Action name (see [`crate::actions::names`]).
    pub action: String,
    /// Action-specific payload, `null` when the action takes none.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Correlation ID echoed back in the response.
    /// Absent for fire-and-forget actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl HelperRequest {
    /// Create a request that expects a response.
    pub fn transaction(
        action: impl Into<String>,
        data: serde_json::Value,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            data,
            transaction_id: Some(transaction_id.into()),
        }
    }

    /// Encode as one protocol line, including the trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
