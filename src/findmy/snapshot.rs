//! Find My snapshot files
//!
//! The Find My app keeps `Devices.data`, `Items.data` and `ItemGroups.data`
//! in its per-user cache directory. Older macOS versions write them as JSON
//! arrays. From macOS 14.4 they are encrypted binary plists, which this
//! server cannot read; those are reported as absent, not as errors.

use std::fmt;
use std::path::Path;

use serde_json::Value;

/// Signature at the start of a binary property list.
pub const BPLIST_MAGIC: &[u8; 6] = b"bplist";

/// The snapshot files the Find My app maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Devices,
    Items,
    ItemGroups,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 3] = [
        SnapshotKind::Devices,
        SnapshotKind::Items,
        SnapshotKind::ItemGroups,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Devices => "Devices",
            SnapshotKind::Items => "Items",
            SnapshotKind::ItemGroups => "ItemGroups",
        }
    }

    /// File name inside the cache directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::Devices => "Devices.data",
            SnapshotKind::Items => "Items.data",
            SnapshotKind::ItemGroups => "ItemGroups.data",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read FindMy {kind} cache file! {reason}")]
    MalformedCacheFile { kind: SnapshotKind, reason: String },
}

impl SnapshotError {
    fn not_an_array(kind: SnapshotKind) -> Self {
        SnapshotError::MalformedCacheFile {
            kind,
            reason: "It is not an array!".to_string(),
        }
    }

    fn bad_format(kind: SnapshotKind, detail: impl fmt::Display) -> Self {
        SnapshotError::MalformedCacheFile {
            kind,
            reason: format!("It is not in the correct format! ({})", detail),
        }
    }
}

/// What a snapshot file looks like on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// A JSON array.
    Json,
    /// Starts with `bplist`; unreadable here.
    BinaryPlist,
    /// No such file.
    Missing,
    /// Anything else.
    Invalid,
}

impl SnapshotFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::BinaryPlist => "bplist",
            SnapshotFormat::Missing => "missing",
            SnapshotFormat::Invalid => "error",
        }
    }
}

/// True if `bytes` starts with the binary plist signature.
pub fn is_binary_plist(bytes: &[u8]) -> bool {
    bytes.len() >= BPLIST_MAGIC.len() && &bytes[..BPLIST_MAGIC.len()] == BPLIST_MAGIC
}

/// Decode snapshot bytes.
///
/// Returns `Ok(None)` for a binary plist, the records for a JSON array, and
/// `MalformedCacheFile` for anything else (including empty input).
pub fn parse_snapshot(kind: SnapshotKind, bytes: &[u8]) -> Result<Option<Vec<Value>>, SnapshotError> {
    if is_binary_plist(bytes) {
        return Ok(None);
    }

    let text = std::str::from_utf8(bytes).map_err(|e| SnapshotError::bad_format(kind, e))?;
    let parsed: Value = serde_json::from_str(text).map_err(|e| SnapshotError::bad_format(kind, e))?;

    match parsed {
        Value::Array(records) => Ok(Some(records)),
        _ => Err(SnapshotError::not_an_array(kind)),
    }
}

/// Classify a file on disk without failing.
pub fn detect_format(path: &Path) -> SnapshotFormat {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return SnapshotFormat::Missing,
        Err(_) => return SnapshotFormat::Invalid,
    };

    match parse_snapshot(SnapshotKind::Devices, &bytes) {
        Ok(Some(_)) => SnapshotFormat::Json,
        Ok(None) => SnapshotFormat::BinaryPlist,
        Err(_) => SnapshotFormat::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_bplist_signature() {
        assert!(is_binary_plist(b"bplist00\x00\x01"));
        assert!(is_binary_plist(b"bplist"));
        assert!(!is_binary_plist(b"bplis"));
        assert!(!is_binary_plist(b"[]"));
        assert!(!is_binary_plist(b""));
    }

    #[test]
    fn test_parse_array() {
        let records = parse_snapshot(SnapshotKind::Devices, br#"[{"id":"device-1"},{"id":"device-2"}]"#)
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_empty_array() {
        let records = parse_snapshot(SnapshotKind::Items, b"[]").unwrap().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_bplist_is_absent() {
        let mut data = b"bplist00".to_vec();
        data.resize(50, 0);
        assert!(parse_snapshot(SnapshotKind::Items, &data).unwrap().is_none());
    }

    #[test]
    fn test_parse_object_is_malformed() {
        let err = parse_snapshot(SnapshotKind::Devices, br#"{"a":1,"b":2}"#).unwrap_err();
        assert!(err.to_string().contains("not an array"));
        assert!(err.to_string().contains("Devices"));
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let inputs: [&[u8]; 4] = [b"not json at all", b"", b"   \n  ", b"\xff\xfe"];
        for input in inputs {
            let result = parse_snapshot(SnapshotKind::Items, input);
            assert!(
                matches!(result, Err(SnapshotError::MalformedCacheFile { .. })),
                "expected malformed for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_detect_format() {
        let dir = TempDir::new().unwrap();

        assert_eq!(detect_format(&dir.path().join("nonexistent.data")), SnapshotFormat::Missing);

        let json = dir.path().join("Devices.data");
        fs::write(&json, "[]").unwrap();
        assert_eq!(detect_format(&json), SnapshotFormat::Json);

        let bplist = dir.path().join("Items.data");
        let mut data = b"bplist00".to_vec();
        data.resize(100, 0);
        fs::write(&bplist, data).unwrap();
        assert_eq!(detect_format(&bplist), SnapshotFormat::BinaryPlist);

        let object = dir.path().join("Object.data");
        fs::write(&object, r#"{"a":1}"#).unwrap();
        assert_eq!(detect_format(&object), SnapshotFormat::Invalid);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(SnapshotKind::Devices.file_name(), "Devices.data");
        assert_eq!(SnapshotKind::Items.file_name(), "Items.data");
        assert_eq!(SnapshotKind::ItemGroups.file_name(), "ItemGroups.data");
    }
}
