//! Item to device normalization

use serde_json::Value;

use super::types::{FindMyDevice, OWNER_PRS_ID};

/// Product type code Apple uses for AirTags.
pub const AIRTAG_PRODUCT_TYPE: &str = "b389";

/// Display name for an item whose model cannot be determined.
pub const UNKNOWN_MODEL: &str = "Unknown";

fn field<'a>(item: &'a Value, key: &str) -> &'a Value {
    item.get(key).unwrap_or(&Value::Null)
}

/// Human-readable model name for an item.
///
/// AirTags get a fixed name, then the product information's model name,
/// then the raw product type code, then "Unknown".
pub fn model_display_name(item: &Value) -> String {
    let product_type = field(item, "productType");
    let type_code = product_type.get("type").and_then(Value::as_str);

    if type_code == Some(AIRTAG_PRODUCT_TYPE) {
        return "AirTag".to_string();
    }

    let model_name = product_type
        .get("productInformation")
        .and_then(|info| info.get("modelName"))
        .and_then(Value::as_str);

    model_name
        .or(type_code)
        .unwrap_or(UNKNOWN_MODEL)
        .to_string()
}

/// Reshape an `Items.data` entry into the `Devices.data` shape.
///
/// Never fails; absent fields stay absent.
pub fn item_to_device(item: &Value) -> FindMyDevice {
    let lost_mode = field(item, "lostModeMetadata");

    FindMyDevice {
        id: field(item, "identifier").clone(),
        name: field(item, "name").clone(),
        device_display_name: field(item, "role")
            .get("emoji")
            .cloned()
            .unwrap_or(Value::Null),
        model_display_name: model_display_name(item),
        address: field(item, "address").clone(),
        location: field(item, "location").clone(),
        crowd_sourced_location: field(item, "crowdSourcedLocation").clone(),
        role: field(item, "role").clone(),
        serial_number: field(item, "serialNumber").clone(),
        product_identifier: field(item, "productIdentifier").clone(),
        product_type: field(item, "productType").clone(),
        group_identifier: field(item, "groupIdentifier").clone(),
        group_name: field(item, "groupName").clone(),
        capabilities: field(item, "capabilities").clone(),
        is_apple_audio_accessory: field(item, "isAppleAudioAccessory").clone(),
        safe_locations: field(item, "safeLocations").clone(),

        lost_mode_enabled: !matches!(lost_mode, Value::Null | Value::Bool(false)),
        lost_mode_capable: true,
        location_enabled: true,
        is_considered_accessory: true,
        location_capable: true,
        fmly_share: false,
        this_device: false,
        is_mac: false,
        prs_id: OWNER_PRS_ID.to_string(),
        battery_status: "Unknown".to_string(),
        audio_channels: Vec::new(),
    }
}

/// Normalize an item straight to JSON.
pub fn item_to_device_value(item: &Value) -> Value {
    // FindMyDevice only holds JSON-native fields, so this cannot fail.
    serde_json::to_value(item_to_device(item)).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_item() -> Value {
        json!({
            "identifier": "item-123",
            "name": "My AirTag",
            "productType": {"type": "b389", "productInformation": null},
            "address": {
                "formattedAddressLines": ["123 Main St", "San Francisco, CA"],
                "locality": "San Francisco"
            },
            "location": {"latitude": 37.7749, "longitude": -122.4194, "timeStamp": 1700000000000_i64},
            "crowdSourcedLocation": {"latitude": 37.775, "longitude": -122.42},
            "batteryStatus": 1,
            "serialNumber": "SN12345",
            "productIdentifier": "prod-123",
            "role": {"name": "Keys", "emoji": "\u{1F511}", "identifier": 1},
            "lostModeMetadata": null,
            "groupIdentifier": "group-abc",
            "groupName": "My Group",
            "isAppleAudioAccessory": false,
            "capabilities": 255,
            "safeLocations": []
        })
    }

    #[test]
    fn test_airtag_wins_over_model_name() {
        let item = json!({
            "productType": {
                "type": "b389",
                "productInformation": {"modelName": "Something Else"}
            }
        });
        assert_eq!(model_display_name(&item), "AirTag");
    }

    #[test]
    fn test_model_name_from_product_information() {
        let item = json!({
            "productType": {
                "type": "some-type",
                "productInformation": {
                    "manufacturerName": "Apple",
                    "modelName": "AirPods Pro",
                    "productIdentifier": 1,
                    "vendorIdentifier": 1,
                    "antennaPower": 1
                }
            }
        });
        assert_eq!(model_display_name(&item), "AirPods Pro");
    }

    #[test]
    fn test_model_name_falls_back_to_type_code() {
        let item = json!({"productType": {"type": "custom-tracker", "productInformation": null}});
        assert_eq!(model_display_name(&item), "custom-tracker");
    }

    #[test]
    fn test_model_name_unknown() {
        assert_eq!(model_display_name(&Value::Null), "Unknown");
        assert_eq!(model_display_name(&json!({})), "Unknown");
        assert_eq!(model_display_name(&json!({"productType": null})), "Unknown");
    }

    #[test]
    fn test_pass_through_fields() {
        let item = make_item();
        let device = item_to_device(&item);

        assert_eq!(device.id, json!("item-123"));
        assert_eq!(device.name, json!("My AirTag"));
        assert_eq!(device.address, item["address"]);
        assert_eq!(device.location, item["location"]);
        assert_eq!(device.crowd_sourced_location, item["crowdSourcedLocation"]);
        assert_eq!(device.serial_number, json!("SN12345"));
        assert_eq!(device.group_identifier, json!("group-abc"));
        assert_eq!(device.group_name, json!("My Group"));
        assert_eq!(device.role, item["role"]);
        assert_eq!(device.device_display_name, json!("\u{1F511}"));
        assert_eq!(device.model_display_name, "AirTag");
    }

    #[test]
    fn test_static_fields() {
        let device = item_to_device(&make_item());

        assert_eq!(device.battery_status, "Unknown");
        assert!(device.audio_channels.is_empty());
        assert!(device.lost_mode_capable);
        assert!(device.location_enabled);
        assert!(device.is_considered_accessory);
        assert!(device.location_capable);
        assert!(!device.fmly_share);
        assert!(!device.this_device);
        assert!(!device.is_mac);
        assert_eq!(device.prs_id, "owner");
    }

    #[test]
    fn test_lost_mode() {
        let mut item = make_item();
        assert!(!item_to_device(&item).lost_mode_enabled);

        item["lostModeMetadata"] = json!({
            "email": "test@example.com",
            "message": "Lost!",
            "ownerNumber": "555-1234",
            "timestamp": 1700000000000_i64
        });
        assert!(item_to_device(&item).lost_mode_enabled);

        item["lostModeMetadata"] = json!(false);
        assert!(!item_to_device(&item).lost_mode_enabled);
    }

    #[test]
    fn test_null_item_does_not_fail() {
        let device = item_to_device(&Value::Null);
        assert_eq!(device.model_display_name, "Unknown");
        assert!(device.id.is_null());
        assert!(!device.lost_mode_enabled);
    }

    #[test]
    fn test_json_shape() {
        let value = item_to_device_value(&make_item());
        assert_eq!(value["id"], "item-123");
        assert_eq!(value["modelDisplayName"], "AirTag");
        assert_eq!(value["isConsideredAccessory"], true);
        assert_eq!(value["prsId"], "owner");
        assert_eq!(value["audioChannels"], json!([]));
        assert_eq!(value["crowdSourcedLocation"]["latitude"], 37.775);

        let sparse = item_to_device_value(&json!({"identifier": "x"}));
        assert!(sparse.get("address").is_none());
        assert!(sparse.get("groupName").is_none());
    }
}
