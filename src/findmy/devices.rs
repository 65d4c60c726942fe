//! Device cache reader
//!
//! Builds the device list from the Find My app's snapshot files. Every call
//! re-reads the files; nothing is cached between reads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use super::normalize::item_to_device_value;
use super::snapshot::{is_binary_plist, parse_snapshot, SnapshotError, SnapshotKind};
use super::types::ItemGroup;

/// Reads Find My snapshot files from one cache directory.
#[derive(Debug, Clone)]
pub struct DeviceCacheReader {
    dir: PathBuf,
}

impl DeviceCacheReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Read one snapshot file.
    ///
    /// `Ok(None)` when the file is missing, unreadable, or an encrypted
    /// binary plist. `MalformedCacheFile` when it exists but is not a JSON
    /// array.
    pub async fn read_snapshot(&self, kind: SnapshotKind) -> Result<Option<Vec<Value>>, SnapshotError> {
        let path = self.path_for(kind);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(file = %path.display(), error = %e, "FindMy cache file not readable");
                return Ok(None);
            }
        };

        if is_binary_plist(&bytes) {
            debug!(
                "FindMy {} cache file is an encrypted binary plist. \
                 This is expected on macOS 14.4+ where Apple encrypts Find My cache data. \
                 Device/item tracking via cache files is not available.",
                kind
            );
            return Ok(None);
        }

        parse_snapshot(kind, &bytes)
    }

    /// Read the item groups file.
    ///
    /// Group names are enrichment only: a missing or encrypted file yields an
    /// empty list.
    pub async fn read_item_groups(&self) -> Result<Vec<Value>, SnapshotError> {
        match self.read_snapshot(SnapshotKind::ItemGroups).await? {
            Some(groups) => Ok(groups),
            None => {
                debug!("FindMy ItemGroups cache file not available; skipping group names");
                Ok(Vec::new())
            }
        }
    }

    /// Read a snapshot, downgrading a malformed file to absent.
    async fn read_or_absent(&self, kind: SnapshotKind) -> Option<Vec<Value>> {
        match self.read_snapshot(kind).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "An error occurred while reading FindMy {} cache file", kind);
                None
            }
        }
    }

    /// Build the unified device list.
    ///
    /// Returns `None` when neither `Devices.data` nor `Items.data` could be
    /// read, which is distinct from `Some(vec![])` (files present, no
    /// devices). Items are normalized to the device shape and appended
    /// after the raw devices.
    pub async fn get_devices(&self) -> Option<Vec<Value>> {
        let (devices, items) = tokio::join!(
            self.read_or_absent(SnapshotKind::Devices),
            self.read_or_absent(SnapshotKind::Items),
        );

        if devices.is_none() && items.is_none() {
            return None;
        }

        let mut items = items.unwrap_or_default();
        if items.iter().any(has_group_identifier) {
            if let Err(e) = self.apply_group_names(&mut items).await {
                debug!(error = %e, "An error occurred while reading FindMy ItemGroups cache file");
            }
        }

        let mut all = devices.unwrap_or_default();
        all.extend(items.iter().map(item_to_device_value));
        Some(all)
    }

    /// Set `groupName` on each item whose `groupIdentifier` is known.
    async fn apply_group_names(&self, items: &mut [Value]) -> Result<(), SnapshotError> {
        let groups = ItemGroup::collect(&self.read_item_groups().await?);
        if groups.is_empty() {
            return Ok(());
        }

        let names: HashMap<String, String> = groups
            .into_iter()
            .map(|g| (g.identifier, g.name))
            .collect();

        for item in items.iter_mut() {
            let name = item
                .get("groupIdentifier")
                .and_then(Value::as_str)
                .and_then(|id| names.get(id))
                .cloned();
            if let (Some(name), Some(obj)) = (name, item.as_object_mut()) {
                obj.insert("groupName".to_string(), Value::String(name));
            }
        }

        Ok(())
    }
}

fn has_group_identifier(item: &Value) -> bool {
    match item.get("groupIdentifier") {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}
