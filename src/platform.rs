//! Host platform detection
//!
//! macOS version gates and per-user paths.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

/// Find My's cache directory relative to `$HOME`.
pub const FINDMY_CACHE_SUBDIR: &str = "Library/Caches/com.apple.findmy.fmipcore";

/// A macOS product version (`sw_vers -productVersion`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MacOsVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl MacOsVersion {
    pub const BIG_SUR: MacOsVersion = MacOsVersion::new(11, 0, 0);
    pub const SONOMA: MacOsVersion = MacOsVersion::new(14, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse `"14.4.1"`, `"11.0"` or `"15"`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for MacOsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What the server knows about the machine it runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Platform {
    /// `None` when not running on macOS (or `sw_vers` is unavailable).
    pub macos: Option<MacOsVersion>,
}

impl Platform {
    pub fn macos(version: MacOsVersion) -> Self {
        Self { macos: Some(version) }
    }

    /// Platform with no macOS version; fails every gate.
    pub fn unsupported() -> Self {
        Self { macos: None }
    }

    /// Probe the host via `sw_vers`.
    pub fn detect() -> Self {
        let output = Command::new("sw_vers").arg("-productVersion").output();
        let macos = match output {
            Ok(output) if output.status.success() => {
                MacOsVersion::parse(&String::from_utf8_lossy(&output.stdout))
            }
            // Not on macOS or sw_vers not available
            _ => None,
        };
        Self { macos }
    }

    pub fn is_at_least(&self, version: MacOsVersion) -> bool {
        self.macos.is_some_and(|v| v >= version)
    }

    pub fn is_min_big_sur(&self) -> bool {
        self.is_at_least(MacOsVersion::BIG_SUR)
    }

    pub fn is_min_sonoma(&self) -> bool {
        self.is_at_least(MacOsVersion::SONOMA)
    }

    pub fn describe(&self) -> String {
        match self.macos {
            Some(v) => format!("macOS {}", v),
            None => "non-macOS host".to_string(),
        }
    }
}

/// `$HOME`, if set.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Default Find My snapshot directory for the current user.
pub fn default_findmy_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("/"))
        .join(FINDMY_CACHE_SUBDIR)
}

/// Real user id of this process.
#[cfg(unix)]
pub fn current_uid() -> u32 {
    // SAFETY: getuid has no preconditions and cannot fail.
    unsafe { libc::getuid() }
}

#[cfg(not(unix))]
pub fn current_uid() -> u32 {
    helper_protocol::BASE_UID
}
