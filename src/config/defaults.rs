//! Built-in defaults (layer 1)
//!
//! Hardcoded defaults for all configuration values.

use serde::{Deserialize, Serialize};

use crate::platform;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// HTTP listen address (default: 127.0.0.1:1234)
    pub listen_addr: String,

    /// Private API helper enabled (default: false)
    pub private_api_enabled: bool,

    /// Helper TCP port (default: derived from the user id)
    pub private_api_port: u16,

    /// Helper request timeout in milliseconds (default: 30000)
    pub request_timeout_ms: u64,

    /// Contacts private API feature flag (default: false)
    pub contacts_private_api_enabled: bool,

    /// Find My snapshot directory
    pub findmy_cache_dir: String,

    /// Application name used in AppleScript (default: "FindMy")
    pub findmy_app_name: String,

    /// Wait after quitting Find My (default: 3000)
    pub quit_wait_ms: u64,

    /// Wait after launching Find My (default: 5000)
    pub launch_wait_ms: u64,

    /// Foreground time before hiding Find My (default: 15000)
    pub refresh_wait_ms: u64,

    /// Skip the friends refresh background lifecycle while one is running (default: false)
    pub single_flight: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:1234".to_string(),
            private_api_enabled: false,
            private_api_port: helper_protocol::port_for_uid(platform::current_uid()),
            request_timeout_ms: 30_000,
            contacts_private_api_enabled: false,
            findmy_cache_dir: platform::default_findmy_dir().to_string_lossy().to_string(),
            findmy_app_name: "FindMy".to_string(),
            quit_wait_ms: 3_000,
            launch_wait_ms: 5_000,
            refresh_wait_ms: 15_000,
            single_flight: false,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "http": {
                "listen_addr": self.listen_addr
            },
            "private_api": {
                "enabled": self.private_api_enabled,
                "port": self.private_api_port,
                "request_timeout_ms": self.request_timeout_ms
            },
            "contacts": {
                "private_api_enabled": self.contacts_private_api_enabled
            },
            "findmy": {
                "cache_dir": self.findmy_cache_dir,
                "app_name": self.findmy_app_name,
                "quit_wait_ms": self.quit_wait_ms,
                "launch_wait_ms": self.launch_wait_ms,
                "refresh_wait_ms": self.refresh_wait_ms,
                "single_flight": self.single_flight
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.listen_addr, "127.0.0.1:1234");
        assert!(!defaults.private_api_enabled);
        assert!(defaults.private_api_port >= helper_protocol::MIN_PORT);
        assert_eq!(defaults.request_timeout_ms, 30_000);
        assert_eq!(defaults.findmy_app_name, "FindMy");
        assert_eq!(defaults.quit_wait_ms, 3_000);
        assert_eq!(defaults.launch_wait_ms, 5_000);
        assert_eq!(defaults.refresh_wait_ms, 15_000);
        assert!(!defaults.single_flight);
        assert!(defaults
            .findmy_cache_dir
            .ends_with("Library/Caches/com.apple.findmy.fmipcore"));
    }

    #[test]
    fn test_to_value() {
        let defaults = BuiltinDefaults::default();
        let value = defaults.to_value();

        assert_eq!(value["http"]["listen_addr"], "127.0.0.1:1234");
        assert_eq!(value["private_api"]["enabled"], false);
        assert_eq!(value["findmy"]["app_name"], "FindMy");
        assert_eq!(value["contacts"]["private_api_enabled"], false);
    }
}
