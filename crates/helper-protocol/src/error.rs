//! Error types for the helper protocol.

/// Errors produced while decoding a line from the helper.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The line is not valid JSON.
    #[error("invalid JSON from helper: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The line is valid JSON but not an object.
    #[error("helper message is not a JSON object")]
    NotAnObject,

    /// The object has neither a `transactionId` nor an `event`.
    #[error("helper message has no transactionId or event")]
    Unrecognized,
}
