//! Helper RPC seam
//!
//! Everything that talks to the helper goes through [`HelperRpc`], so the
//! refresh and contacts paths can run against [`super::MockHelper`] in tests.

use std::io;

use async_trait::async_trait;
use serde_json::Value;

/// Helper errors
#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("Private API Helper is not connected!")]
    NotConnected,

    #[error("Transaction for {action} timed out after {after_ms} ms")]
    Timeout { action: String, after_ms: u64 },

    #[error("{message}")]
    Helper { action: String, message: String },

    #[error("Private API Helper disconnected before responding")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Payload of a resolved transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionResult {
    pub data: Value,
}

impl TransactionResult {
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

/// Request/response channel to the helper.
#[async_trait]
pub trait HelperRpc: Send + Sync {
    /// True while a helper connection is active.
    fn is_connected(&self) -> bool;

    /// Send `action` and wait for its transaction to resolve.
    async fn send_request(&self, action: &str, data: Value) -> Result<TransactionResult, HelperError>;
}
