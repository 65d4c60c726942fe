//! Find My device shapes

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Owner marker written into normalized items.
pub const OWNER_PRS_ID: &str = "owner";

/// A tracker item (AirTag, third-party accessory) reshaped to look like an
/// entry from `Devices.data`.
///
/// Pass-through fields keep whatever JSON the item carried and are omitted
/// when absent. The remaining fields are fixed: a normalized item is always
/// an accessory owned by someone else's account family, never this Mac.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMyDevice {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub name: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub device_display_name: Value,
    pub model_display_name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub address: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub location: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub crowd_sourced_location: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub role: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub serial_number: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub product_identifier: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub product_type: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub group_identifier: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub group_name: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub capabilities: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub is_apple_audio_accessory: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub safe_locations: Value,

    pub lost_mode_enabled: bool,
    pub lost_mode_capable: bool,
    pub location_enabled: bool,
    pub is_considered_accessory: bool,
    pub location_capable: bool,
    pub fmly_share: bool,
    pub this_device: bool,
    pub is_mac: bool,
    pub prs_id: String,
    pub battery_status: String,
    pub audio_channels: Vec<Value>,
}

/// Entry from `ItemGroups.data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroup {
    pub identifier: String,
    pub name: String,
}

impl ItemGroup {
    /// Pick the groups that have both an identifier and a name.
    pub fn collect(records: &[Value]) -> Vec<ItemGroup> {
        records
            .iter()
            .filter_map(|r| serde_json::from_value(r.clone()).ok())
            .collect()
    }
}
