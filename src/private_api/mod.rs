//! Private API facade
//!
//! Gates helper calls on the feature flag and connection state, and
//! validates arguments before anything goes over the wire.

mod contacts;
mod findmy;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};
use crate::helper::{HelperRpc, TransactionResult};
use crate::platform::Platform;

pub use contacts::PhotoQuality;

/// Entry point for helper-backed actions.
#[derive(Clone)]
pub struct PrivateApi {
    rpc: Arc<dyn HelperRpc>,
    enabled: bool,
    platform: Platform,
}

impl PrivateApi {
    pub fn new(rpc: Arc<dyn HelperRpc>, enabled: bool, platform: Platform) -> Self {
        Self {
            rpc,
            enabled,
            platform,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_connected(&self) -> bool {
        self.rpc.is_connected()
    }

    /// Fail unless the private API is enabled and the helper is connected.
    pub fn check_status(&self) -> BridgeResult<()> {
        if !self.enabled {
            return Err(BridgeError::FeatureDisabled(
                "Private API is not enabled! Enable it in the server settings.".to_string(),
            ));
        }
        self.check_connected()
    }

    /// Fail unless the helper is connected.
    pub fn check_connected(&self) -> BridgeResult<()> {
        if !self.rpc.is_connected() {
            return Err(crate::helper::HelperError::NotConnected.into());
        }
        Ok(())
    }

    async fn send(&self, action: &str, data: Value) -> BridgeResult<TransactionResult> {
        Ok(self.rpc.send_request(action, data).await?)
    }
}

/// Reject empty required arguments.
fn require_fields(action: &str, fields: &[(&str, &Value)]) -> BridgeResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| is_missing(value))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BridgeError::InvalidInput(format!(
            "Missing required field(s) for {}: {}",
            action,
            missing.join(", ")
        )))
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
