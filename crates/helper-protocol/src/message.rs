//! Messages received from the helper.

use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// A decoded line from the helper.
#[derive(Debug, Clone, PartialEq)]
pub enum HelperMessage {
    /// Response to a request carrying the same `transactionId`.
    Transaction(TransactionResponse),
    /// Unsolicited event.
    Event(HelperEvent),
}

/// Transaction response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResponse {
    /// Echoed transaction ID.
    pub transaction_id: String,
    /// Error reported by the helper, if the action failed.
    pub error: Option<String>,
    /// Response payload.
    ///
    /// The helper's `data` field when present and non-null, otherwise every
    /// remaining top-level field (e.g. `{"locations": [...]}`).
    pub data: Value,
}

/// Unsolicited helper event.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperEvent {
    /// Event name (see [`crate::actions::events`]).
    pub event: String,
    /// Event payload, `null` when absent.
    pub data: Value,
    /// Any other top-level fields (e.g. `message`, `process` on ping).
    pub fields: Map<String, Value>,
}

impl HelperEvent {
    /// Get a string field from the event envelope.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

impl HelperMessage {
    /// Decode one protocol line (without its line terminator).
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut obj) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let transaction_id = match obj.get("transactionId") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            _ => None,
        };

        if let Some(transaction_id) = transaction_id {
            obj.remove("transactionId");
            let error = match obj.remove("error") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s),
                Some(other) => Some(other.to_string()),
            };
            let data = match obj.remove("data") {
                Some(data) if !data.is_null() => data,
                _ => Value::Object(obj),
            };
            return Ok(HelperMessage::Transaction(TransactionResponse {
                transaction_id,
                error,
                data,
            }));
        }

        if let Some(Value::String(event)) = obj.remove("event") {
            let data = obj.remove("data").unwrap_or(Value::Null);
            return Ok(HelperMessage::Event(HelperEvent {
                event,
                data,
                fields: obj,
            }));
        }

        Err(ProtocolError::Unrecognized)
    }
}
