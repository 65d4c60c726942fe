//! Typed view over the effective configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::BuiltinDefaults;
use super::effective::{ConfigError, EffectiveConfig};

/// Settings the server runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeSettings {
    pub listen_addr: SocketAddr,
    pub private_api_enabled: bool,
    pub private_api_port: u16,
    pub request_timeout: Duration,
    pub contacts_private_api_enabled: bool,
    pub findmy_cache_dir: PathBuf,
    pub findmy_app_name: String,
    pub quit_wait: Duration,
    pub launch_wait: Duration,
    pub refresh_wait: Duration,
    pub single_flight: bool,
}

impl BridgeSettings {
    /// Read every key from a validated config.
    ///
    /// Missing keys (a layer nulled them out) fall back to built-in defaults.
    pub fn from_effective(config: &EffectiveConfig) -> Result<Self, ConfigError> {
        let defaults = BuiltinDefaults::default();

        let listen_addr = config
            .get_str("http.listen_addr")
            .unwrap_or(&defaults.listen_addr)
            .parse::<SocketAddr>()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "http.listen_addr".to_string(),
                reason: e.to_string(),
            })?;

        let private_api_port = match config.get_u64("private_api.port") {
            Some(port) => u16::try_from(port).map_err(|_| ConfigError::Invalid {
                key: "private_api.port".to_string(),
                reason: format!("out of range: {}", port),
            })?,
            None => defaults.private_api_port,
        };

        let millis = |key: &str, default: u64| {
            Duration::from_millis(config.get_u64(key).unwrap_or(default))
        };

        Ok(Self {
            listen_addr,
            private_api_enabled: config
                .get_bool("private_api.enabled")
                .unwrap_or(defaults.private_api_enabled),
            private_api_port,
            request_timeout: millis("private_api.request_timeout_ms", defaults.request_timeout_ms),
            contacts_private_api_enabled: config
                .get_bool("contacts.private_api_enabled")
                .unwrap_or(defaults.contacts_private_api_enabled),
            findmy_cache_dir: PathBuf::from(
                config
                    .get_str("findmy.cache_dir")
                    .unwrap_or(&defaults.findmy_cache_dir),
            ),
            findmy_app_name: config
                .get_str("findmy.app_name")
                .unwrap_or(&defaults.findmy_app_name)
                .to_string(),
            quit_wait: millis("findmy.quit_wait_ms", defaults.quit_wait_ms),
            launch_wait: millis("findmy.launch_wait_ms", defaults.launch_wait_ms),
            refresh_wait: millis("findmy.refresh_wait_ms", defaults.refresh_wait_ms),
            single_flight: config
                .get_bool("findmy.single_flight")
                .unwrap_or(defaults.single_flight),
        })
    }
}
