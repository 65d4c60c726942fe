//! Friend location records
//!
//! A [`LocationRecord`] is one friend's last known location as reported by
//! the helper, either in a `refresh-findmy-friends` response or in a
//! `new-findmy-location` event.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Source tier of a location fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    /// Older, lower-fidelity pathway. Lowest trust.
    Legacy,
    /// Live location session.
    Live,
    /// Shallow (cached) location from the newer pathway.
    Shallow,
    /// Any status this server does not know about.
    #[serde(other)]
    Unknown,
}

impl LocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationStatus::Legacy => "legacy",
            LocationStatus::Live => "live",
            LocationStatus::Shallow => "shallow",
            LocationStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A friend's last known location.
///
/// Serialized with the helper's field names. Fields this server does not
/// model are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Friend identity (email or phone number); the cache key.
    #[serde(default)]
    pub handle: Option<String>,

    /// `[latitude, longitude]`. `[0, 0]` means no precise fix.
    #[serde(default)]
    pub coordinates: Option<[f64; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Epoch milliseconds of the fix.
    #[serde(default, deserialize_with = "de_opt_millis")]
    pub last_updated: Option<i64>,

    /// 0/1 flag. Informational only.
    #[serde(default, deserialize_with = "de_opt_flag")]
    pub is_locating_in_progress: Option<u8>,

    #[serde(default)]
    pub status: Option<LocationStatus>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocationRecord {
    /// Create a record with just a handle; everything else absent.
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: Some(handle.into()),
            coordinates: None,
            long_address: None,
            short_address: None,
            title: None,
            subtitle: None,
            last_updated: None,
            is_locating_in_progress: None,
            status: None,
            extra: Map::new(),
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some([latitude, longitude]);
        self
    }

    pub fn with_status(mut self, status: LocationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_last_updated(mut self, millis: i64) -> Self {
        self.last_updated = Some(millis);
        self
    }

    /// The cache key, if usable. Empty handles count as absent.
    pub fn key(&self) -> Option<&str> {
        self.handle.as_deref().filter(|h| !h.is_empty())
    }

    /// Coordinates for comparison; absent reads as `[0, 0]`.
    pub fn coords_or_zero(&self) -> [f64; 2] {
        self.coordinates.unwrap_or([0.0, 0.0])
    }

    /// Timestamp for comparison; absent reads as `0`.
    pub fn last_updated_or_zero(&self) -> i64 {
        self.last_updated.unwrap_or(0)
    }

    /// True when both coordinate components are zero (or absent).
    pub fn has_zero_coordinates(&self) -> bool {
        let [lat, lon] = self.coords_or_zero();
        lat == 0.0 && lon == 0.0
    }

    pub fn is_legacy(&self) -> bool {
        self.status == Some(LocationStatus::Legacy)
    }

    /// Parse a list of records from a JSON array, skipping entries that are
    /// not objects or fail to decode.
    pub fn list_from_value(value: &Value) -> Vec<LocationRecord> {
        let Some(items) = value.as_array() else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping undecodable location record");
                    None
                }
            })
            .collect()
    }
}

/// Accept integer or floating-point millisecond timestamps.
fn de_opt_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    })
}

/// Accept `0`/`1` or `true`/`false`.
fn de_opt_flag<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(u8::from(b)),
        Some(Value::Number(n)) => n.as_u64().map(|v| u8::from(v != 0)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_helper_record() {
        let value = json!({
            "handle": "test@icloud.com",
            "coordinates": [37.7749, -122.4194],
            "long_address": "123 Main St",
            "short_address": "Main St",
            "title": "Home",
            "subtitle": "San Francisco",
            "last_updated": 1700000000000_i64,
            "is_locating_in_progress": 0,
            "status": "live"
        });

        let record: LocationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.key(), Some("test@icloud.com"));
        assert_eq!(record.coordinates, Some([37.7749, -122.4194]));
        assert_eq!(record.status, Some(LocationStatus::Live));
        assert_eq!(record.last_updated, Some(1700000000000));
        assert_eq!(record.is_locating_in_progress, Some(0));
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let value = json!({"handle": "a", "status": "shallow", "accuracy": 12.5});
        let record: LocationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.extra.get("accuracy"), Some(&json!(12.5)));

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["accuracy"], 12.5);
        assert_eq!(out["status"], "shallow");
    }

    #[test]
    fn test_unknown_status() {
        let record: LocationRecord =
            serde_json::from_value(json!({"handle": "a", "status": "precise"})).unwrap();
        assert_eq!(record.status, Some(LocationStatus::Unknown));
        assert!(!record.is_legacy());
    }

    #[test]
    fn test_lenient_numbers() {
        let record: LocationRecord = serde_json::from_value(json!({
            "handle": "a",
            "last_updated": 1700000000000.0,
            "is_locating_in_progress": true
        }))
        .unwrap();
        assert_eq!(record.last_updated, Some(1700000000000));
        assert_eq!(record.is_locating_in_progress, Some(1));
    }

    #[test]
    fn test_missing_fields_compare_as_zero() {
        let record = LocationRecord::new("a");
        assert_eq!(record.coords_or_zero(), [0.0, 0.0]);
        assert_eq!(record.last_updated_or_zero(), 0);
        assert!(record.has_zero_coordinates());
        assert!(record.coordinates.is_none());
    }

    #[test]
    fn test_empty_handle_has_no_key() {
        let mut record = LocationRecord::new("");
        assert_eq!(record.key(), None);
        record.handle = None;
        assert_eq!(record.key(), None);
    }

    #[test]
    fn test_list_from_value_skips_garbage() {
        let value = json!([{"handle": "a"}, 42, {"handle": "b", "coordinates": "nope"}]);
        let records = LocationRecord::list_from_value(&value);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key(), Some("a"));

        assert!(LocationRecord::list_from_value(&json!({"a": 1})).is_empty());
    }
}
