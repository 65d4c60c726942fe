//! Crate-level error

use crate::apple::AppControlError;
use crate::config::ConfigError;
use crate::findmy::SnapshotError;
use crate::helper::HelperError;

/// Errors surfaced by bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A feature flag is off.
    #[error("{0}")]
    FeatureDisabled(String),

    /// The host macOS is too old (or not macOS).
    #[error("{0}")]
    UnsupportedPlatform(String),

    /// Missing or malformed caller input.
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Helper(#[from] HelperError),

    #[error(transparent)]
    AppControl(#[from] AppControlError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
