//! Contacts over the private API
//!
//! Thin pass-through to the helper's contact actions, guarded by the
//! contacts feature flag.

pub mod types;

use serde_json::{json, Value};

use crate::error::{BridgeError, BridgeResult};
use crate::helper::TransactionResult;
use crate::private_api::{PhotoQuality, PrivateApi};

pub use types::{
    BatchIMessageStatus, BusinessContactInfo, ContactAvailability, ContactDetail, ContactPhoto,
    HandleContactInfo, HandleSibling, SuggestedName,
};

/// Contacts operations exposed over HTTP.
#[derive(Clone)]
pub struct ContactsApi {
    private_api: PrivateApi,
    enabled: bool,
}

impl ContactsApi {
    pub fn new(private_api: PrivateApi, enabled: bool) -> Self {
        Self {
            private_api,
            enabled,
        }
    }

    fn check(&self) -> BridgeResult<()> {
        if !self.enabled {
            return Err(BridgeError::FeatureDisabled(
                "Contact Private API is not enabled! Enable it in the server settings.".to_string(),
            ));
        }
        self.private_api.check_status()
    }

    pub async fn get_handles_contact_info(&self, include_photos: bool) -> BridgeResult<Value> {
        self.check()?;
        let result = self.private_api.get_handles_contact_info(include_photos).await?;
        Ok(extract_data(result, json!([])))
    }

    pub async fn get_contact_for_handle(&self, address: &str) -> BridgeResult<Value> {
        self.check()?;
        let result = self.private_api.get_contact_for_handle(address).await?;
        Ok(extract_data(result, Value::Null))
    }

    pub async fn get_contact_photo(&self, address: &str, quality: PhotoQuality) -> BridgeResult<Value> {
        self.check()?;
        let result = self.private_api.get_contact_photo(address, quality).await?;
        Ok(extract_data(result, Value::Null))
    }

    pub async fn batch_check_imessage(&self, addresses: &[String]) -> BridgeResult<Value> {
        self.check()?;
        let result = self.private_api.batch_check_imessage(addresses).await?;
        Ok(extract_data(result, json!({})))
    }

    pub async fn get_handle_siblings(&self, address: &str) -> BridgeResult<Value> {
        self.check()?;
        let result = self.private_api.get_handle_siblings(address).await?;
        Ok(extract_data(result, Value::Null))
    }

    pub async fn get_suggested_names(&self, address: Option<&str>) -> BridgeResult<Value> {
        self.check()?;
        let result = self.private_api.get_suggested_names(address).await?;
        Ok(extract_data(result, json!([])))
    }

    pub async fn get_contact_availability(&self, address: &str) -> BridgeResult<Value> {
        self.check()?;
        let result = self.private_api.get_contact_availability(address).await?;
        Ok(extract_data(result, Value::Null))
    }

    pub async fn detect_business_contact(&self, address: &str) -> BridgeResult<Value> {
        self.check()?;
        let result = self.private_api.detect_business_contact(address).await?;
        Ok(extract_data(result, Value::Null))
    }
}

/// Pull the payload out of a transaction result.
///
/// An empty helper `data` field leaves the payload wrapped one level deeper
/// (`{"data": [...]}`); unwrap it. Null payloads become `fallback`.
pub fn extract_data(result: TransactionResult, fallback: Value) -> Value {
    match result.data {
        Value::Object(mut obj) if obj.contains_key("data") => match obj.remove("data") {
            Some(Value::Null) | None => fallback,
            Some(inner) => inner,
        },
        Value::Null => fallback,
        payload => payload,
    }
}
