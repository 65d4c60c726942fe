//! `/contact/private` routes

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::Value;

use super::response::{ApiError, ApiResult, Success};
use super::state::AppState;
use crate::private_api::PhotoQuality;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contact/private/handles", get(get_handles))
        .route("/contact/private/suggested-names", get(get_suggested_names))
        .route("/contact/private/imessage/batch", post(batch_check_imessage))
        .route("/contact/private/{address}", get(get_contact))
        .route("/contact/private/{address}/photo", get(get_contact_photo))
        .route("/contact/private/{address}/siblings", get(get_handle_siblings))
        .route("/contact/private/{address}/availability", get(get_contact_availability))
        .route("/contact/private/{address}/business", get(detect_business))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandlesQuery {
    include_photos: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AddressQuery {
    address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PhotoQuery {
    quality: Option<String>,
}

async fn get_handles(State(state): State<AppState>, Query(query): Query<HandlesQuery>) -> ApiResult {
    let include_photos = query.include_photos.as_deref() == Some("true");
    let data = state
        .contacts
        .get_handles_contact_info(include_photos)
        .await
        .map_err(|e| ApiError::from_bridge("Failed to fetch handle contact info!", e))?;
    Success::new("Successfully fetched handle contact info!", data)
}

async fn get_contact(State(state): State<AppState>, Path(address): Path<String>) -> ApiResult {
    let data = state
        .contacts
        .get_contact_for_handle(&address)
        .await
        .map_err(|e| ApiError::from_bridge("Failed to fetch contact details!", e))?;
    Success::new("Successfully fetched contact details!", data)
}

async fn get_contact_photo(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<PhotoQuery>,
) -> ApiResult {
    let quality = PhotoQuality::from_query(query.quality.as_deref());
    let data = state
        .contacts
        .get_contact_photo(&address, quality)
        .await
        .map_err(|e| ApiError::from_bridge("Failed to fetch contact photo!", e))?;
    Success::new("Successfully fetched contact photo!", data)
}

async fn batch_check_imessage(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let addresses = parse_addresses(&body)?;
    let data = state
        .contacts
        .batch_check_imessage(&addresses)
        .await
        .map_err(|e| ApiError::from_bridge("Failed to check iMessage availability!", e))?;
    Success::new("Successfully checked iMessage availability!", data)
}

/// `{"addresses": ["..."]}` or a 400.
fn parse_addresses(body: &[u8]) -> Result<Vec<String>, ApiError> {
    let invalid = || ApiError::bad_request("addresses must be an array of strings!");

    let body: Value = serde_json::from_slice(body).map_err(|_| invalid())?;
    let Some(items) = body.get("addresses").and_then(Value::as_array) else {
        return Err(invalid());
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

async fn get_handle_siblings(State(state): State<AppState>, Path(address): Path<String>) -> ApiResult {
    let data = state
        .contacts
        .get_handle_siblings(&address)
        .await
        .map_err(|e| ApiError::from_bridge("Failed to fetch handle siblings!", e))?;
    Success::new("Successfully fetched handle siblings!", data)
}

async fn get_suggested_names(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> ApiResult {
    let data = state
        .contacts
        .get_suggested_names(query.address.as_deref())
        .await
        .map_err(|e| ApiError::from_bridge("Failed to fetch suggested names!", e))?;
    Success::new("Successfully fetched suggested names!", data)
}

async fn get_contact_availability(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult {
    let data = state
        .contacts
        .get_contact_availability(&address)
        .await
        .map_err(|e| ApiError::from_bridge("Failed to fetch contact availability!", e))?;
    Success::new("Successfully fetched contact availability!", data)
}

async fn detect_business(State(state): State<AppState>, Path(address): Path<String>) -> ApiResult {
    let data = state
        .contacts
        .detect_business_contact(&address)
        .await
        .map_err(|e| ApiError::from_bridge("Failed to detect business contact!", e))?;
    Success::new("Successfully detected business contact!", data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addresses() {
        assert_eq!(
            parse_addresses(br#"{"addresses":["a@x.com","+1555"]}"#).unwrap(),
            vec!["a@x.com".to_string(), "+1555".to_string()]
        );
        assert!(parse_addresses(br#"{"addresses":[]}"#).unwrap().is_empty());

        let bad_bodies: [&[u8]; 4] = [br#"{"addresses":"a@x.com"}"#, br#"{}"#, b"", br#"{"addresses":[1]}"#];
        for bad in bad_bodies {
            let err = parse_addresses(bad).unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        }
    }
}
