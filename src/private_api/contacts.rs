use std::fmt;

use helper_protocol::actions::names;
use serde_json::{json, Value};

use super::{require_fields, PrivateApi};
use crate::error::BridgeResult;
use crate::helper::TransactionResult;

/// Requested contact photo size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotoQuality {
    #[default]
    Full,
    Thumbnail,
}

impl PhotoQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoQuality::Full => "full",
            PhotoQuality::Thumbnail => "thumbnail",
        }
    }

    /// `"thumbnail"` selects thumbnails; anything else is full size.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("thumbnail") => PhotoQuality::Thumbnail,
            _ => PhotoQuality::Full,
        }
    }
}

impl fmt::Display for PhotoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PrivateApi {
    pub async fn get_handles_contact_info(&self, include_photos: bool) -> BridgeResult<TransactionResult> {
        self.send(
            names::GET_HANDLES_CONTACT_INFO,
            json!({ "includePhotos": include_photos }),
        )
        .await
    }

    pub async fn get_contact_for_handle(&self, address: &str) -> BridgeResult<TransactionResult> {
        self.send_for_address(names::GET_CONTACT_FOR_HANDLE, address).await
    }

    pub async fn get_contact_photo(
        &self,
        address: &str,
        quality: PhotoQuality,
    ) -> BridgeResult<TransactionResult> {
        let action = names::GET_CONTACT_PHOTO;
        require_fields(action, &[("address", &json!(address))])?;
        self.send(action, json!({ "address": address, "quality": quality.as_str() }))
            .await
    }

    pub async fn batch_check_imessage(&self, addresses: &[String]) -> BridgeResult<TransactionResult> {
        let action = names::BATCH_CHECK_IMESSAGE;
        let addresses = json!(addresses);
        require_fields(action, &[("addresses", &addresses)])?;
        self.send(action, json!({ "addresses": addresses })).await
    }

    pub async fn get_handle_siblings(&self, address: &str) -> BridgeResult<TransactionResult> {
        self.send_for_address(names::GET_HANDLE_SIBLINGS, address).await
    }

    /// Suggested names for one handle, or for all handles when `address` is
    /// `None`.
    pub async fn get_suggested_names(&self, address: Option<&str>) -> BridgeResult<TransactionResult> {
        let data = match address.filter(|a| !a.is_empty()) {
            Some(address) => json!({ "address": address }),
            None => json!({}),
        };
        self.send(names::GET_SUGGESTED_NAMES, data).await
    }

    pub async fn get_contact_availability(&self, address: &str) -> BridgeResult<TransactionResult> {
        self.send_for_address(names::GET_CONTACT_AVAILABILITY, address).await
    }

    pub async fn detect_business_contact(&self, address: &str) -> BridgeResult<TransactionResult> {
        self.send_for_address(names::DETECT_BUSINESS_CONTACT, address).await
    }

    async fn send_for_address(&self, action: &str, address: &str) -> BridgeResult<TransactionResult> {
        let address = Value::String(address.to_string());
        require_fields(action, &[("address", &address)])?;
        self.send(action, json!({ "address": address })).await
    }
}
