use helper_protocol::actions::names;
use serde_json::{json, Value};

use super::PrivateApi;
use crate::error::{BridgeError, BridgeResult};
use crate::findmy::LocationRecord;

impl PrivateApi {
    /// Ask the helper for fresh friend locations.
    pub async fn refresh_friends(&self) -> BridgeResult<Vec<LocationRecord>> {
        if !self.platform.is_min_big_sur() {
            return Err(BridgeError::UnsupportedPlatform(format!(
                "Refreshing FindMy friends requires macOS 11 (Big Sur) or newer; this is a {}",
                self.platform.describe()
            )));
        }

        let result = self.send(names::REFRESH_FINDMY_FRIENDS, json!({})).await?;
        let locations = result.data.get("locations").unwrap_or(&Value::Null);
        Ok(LocationRecord::list_from_value(locations))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::helper::MockHelper;
    use crate::platform::{MacOsVersion, Platform};

    #[tokio::test]
    async fn test_refresh_friends_reads_locations() {
        let helper = Arc::new(MockHelper::new());
        helper.respond(
            names::REFRESH_FINDMY_FRIENDS,
            json!({"locations": [{"handle": "a@x.com", "coordinates": [1.0, 2.0]}]}),
        );
        let api = PrivateApi::new(helper.clone(), true, Platform::macos(MacOsVersion::new(12, 0, 0)));

        let records = api.refresh_friends().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(helper.request_count(names::REFRESH_FINDMY_FRIENDS), 1);
    }

    #[tokio::test]
    async fn test_refresh_friends_without_locations() {
        let helper = Arc::new(MockHelper::new());
        let api = PrivateApi::new(helper, true, Platform::macos(MacOsVersion::new(12, 0, 0)));

        assert!(api.refresh_friends().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_friends_needs_big_sur() {
        let helper = Arc::new(MockHelper::new());
        let api = PrivateApi::new(helper.clone(), true, Platform::macos(MacOsVersion::new(10, 15, 7)));

        let err = api.refresh_friends().await.unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedPlatform(_)));
        assert!(helper.requests().is_empty());
    }
}
