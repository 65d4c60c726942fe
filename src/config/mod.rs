//! Configuration merge system
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in defaults
//! 2. Host/user config (~/.config/findmy-bridge/config.toml)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{merge_into, merge_layers};
pub use settings::BridgeSettings;

use std::path::PathBuf;

/// Default host config file location.
pub fn default_host_config_path() -> Option<PathBuf> {
    crate::platform::home_dir().map(|home| home.join(".config/findmy-bridge/config.toml"))
}
