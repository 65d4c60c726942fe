//! Effective configuration
//!
//! The merged layers, which sources contributed to them, and any keys
//! this server does not recognise.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Upper bound for each Find My lifecycle wait
pub const MAX_LIFECYCLE_WAIT_MS: u64 = 120_000;

/// Upper bound for a helper request timeout
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 600_000;

/// Where a layer came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Cli,
}

/// One contributing layer.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// SHA-256 of the host file as read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ConfigSource {
    fn layer(origin: ConfigOrigin) -> Self {
        Self {
            origin,
            path: None,
            sha256: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    SocketAddr,
    Bool,
    Port,
    Millis { min: u64, max: u64 },
    NonEmpty,
    Text,
}

/// Every key the server reads, with its constraint.
const RULES: &[(&str, Rule)] = &[
    ("http.listen_addr", Rule::SocketAddr),
    ("private_api.enabled", Rule::Bool),
    ("private_api.port", Rule::Port),
    (
        "private_api.request_timeout_ms",
        Rule::Millis {
            min: 1,
            max: MAX_REQUEST_TIMEOUT_MS,
        },
    ),
    ("contacts.private_api_enabled", Rule::Bool),
    ("findmy.cache_dir", Rule::Text),
    ("findmy.app_name", Rule::NonEmpty),
    (
        "findmy.quit_wait_ms",
        Rule::Millis {
            min: 0,
            max: MAX_LIFECYCLE_WAIT_MS,
        },
    ),
    (
        "findmy.launch_wait_ms",
        Rule::Millis {
            min: 0,
            max: MAX_LIFECYCLE_WAIT_MS,
        },
    ),
    (
        "findmy.refresh_wait_ms",
        Rule::Millis {
            min: 0,
            max: MAX_LIFECYCLE_WAIT_MS,
        },
    ),
    ("findmy.single_flight", Rule::Bool),
];

impl Rule {
    fn check(self, value: &Value) -> Result<(), String> {
        let ok = match self {
            Rule::SocketAddr => value
                .as_str()
                .is_some_and(|s| s.parse::<SocketAddr>().is_ok()),
            Rule::Bool => value.is_boolean(),
            Rule::Port => value
                .as_u64()
                .is_some_and(|p| (1..=u64::from(u16::MAX)).contains(&p)),
            Rule::Millis { min, max } => value.as_u64().is_some_and(|ms| (min..=max).contains(&ms)),
            Rule::NonEmpty => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            Rule::Text => value.is_string(),
        };
        if ok {
            return Ok(());
        }
        Err(match self {
            Rule::SocketAddr => format!("expected an address like 127.0.0.1:1234, got {}", value),
            Rule::Bool => format!("expected true or false, got {}", value),
            Rule::Port => format!("expected a port in [1, 65535], got {}", value),
            Rule::Millis { min, max } => {
                format!("expected milliseconds in [{}, {}], got {}", min, max, value)
            }
            Rule::NonEmpty => format!("expected a non-empty string, got {}", value),
            Rule::Text => format!("expected a string, got {}", value),
        })
    }
}

/// The configuration the server runs with.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub config: Value,

    /// Contributing layers, lowest precedence first.
    pub sources: Vec<ConfigSource>,

    /// Dotted keys present in some layer that nothing reads.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown_keys: Vec<String>,
}

impl EffectiveConfig {
    /// Merge built-ins, the host file (skipped when missing) and CLI
    /// overrides, then validate.
    pub fn build(
        host_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource::layer(ConfigOrigin::Builtin)];

        if let Some(path) = host_config_path {
            if let Some((value, sha256)) = read_host_file(path)? {
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Host,
                    path: Some(path.to_path_buf()),
                    sha256: Some(sha256),
                });
            }
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource::layer(ConfigOrigin::Cli));
        }

        let config = merge_layers(layers);
        for (key, rule) in RULES {
            if let Some(value) = lookup(&config, key) {
                rule.check(value).map_err(|reason| ConfigError::Invalid {
                    key: key.to_string(),
                    reason,
                })?;
            }
        }

        Ok(Self {
            unknown_keys: unknown_keys(&config),
            config,
            sources,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Value at a dotted key; an explicit `null` counts as unset.
    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.config, key)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}

/// Parse the host TOML file. `None` when it does not exist.
fn read_host_file(path: &Path) -> Result<Option<(Value, String)>, ConfigError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let sha256 = hex::encode(Sha256::digest(&bytes));

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let text = std::str::from_utf8(&bytes).map_err(|e| parse_error(e.to_string()))?;
    let value: Value = toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;

    Ok(Some((value, sha256)))
}

fn lookup<'a>(config: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(config, |node, part| node.get(part))
        .filter(|v| !v.is_null())
}

fn unknown_keys(config: &Value) -> Vec<String> {
    let Some(sections) = config.as_object() else {
        return Vec::new();
    };
    let known = |key: &str| RULES.iter().any(|(k, _)| *k == key);

    let mut unknown = Vec::new();
    for (section, body) in sections {
        match body.as_object() {
            Some(fields) => unknown.extend(
                fields
                    .keys()
                    .map(|field| format!("{}.{}", section, field))
                    .filter(|key| !known(key)),
            ),
            None => unknown.push(section.clone()),
        }
    }
    unknown
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid {key}: {reason}")]
    Invalid { key: String, reason: String },
}
