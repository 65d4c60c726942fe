//! Contact payloads returned by the helper

use serde::{Deserialize, Serialize};

/// Contact info for one message handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleContactInfo {
    pub handle_id: String,
    pub service: String,
    pub full_name: Option<String>,
    pub is_contact: bool,
    pub is_business: bool,
    #[serde(rename = "personCentricID")]
    pub person_centric_id: Option<String>,
    #[serde(rename = "cnContactID")]
    pub cn_contact_id: Option<String>,
    pub suggested_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_base64: Option<String>,
    #[serde(default)]
    pub siblings: Vec<HandleSibling>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetail {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub is_contact: bool,
    pub is_business: bool,
    #[serde(rename = "personCentricID")]
    pub person_centric_id: Option<String>,
    #[serde(rename = "cnContactID")]
    pub cn_contact_id: Option<String>,
    pub is_in_address_book: bool,
    #[serde(default)]
    pub all_addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPhoto {
    pub address: String,
    /// Base64 image data.
    pub photo_data: Option<String>,
    pub quality: String,
}

/// Another handle belonging to the same person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleSibling {
    pub handle_id: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedName {
    pub handle_id: String,
    pub suggested_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAvailability {
    pub availability: i64,
    pub availability_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessContactInfo {
    pub address: String,
    pub is_business: bool,
    pub is_mako: bool,
    pub is_apple: bool,
    pub business_name: Option<String>,
}

/// Address -> iMessage status code.
pub type BatchIMessageStatus = std::collections::BTreeMap<String, i64>;
