//! `/icloud/findmy` routes

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;

use super::response::{ApiError, ApiResult, Success};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/icloud/findmy/friends", get(get_friends))
        .route("/icloud/findmy/friends/refresh", post(refresh_friends))
        .route("/icloud/findmy/devices", get(get_devices))
        .route("/icloud/findmy/devices/refresh", post(refresh_devices))
}

async fn get_friends(State(state): State<AppState>) -> ApiResult {
    Success::new(
        "Successfully fetched Find My friends locations!",
        state.findmy.get_friends(),
    )
}

async fn refresh_friends(State(state): State<AppState>) -> ApiResult {
    let friends = state
        .findmy
        .refresh_friends()
        .await
        .map_err(|e| ApiError::from_bridge("Failed to refresh Find My friends locations!", e))?;
    Success::new("Successfully refreshed Find My friends locations!", friends)
}

async fn get_devices(State(state): State<AppState>) -> ApiResult {
    Success::new(
        "Successfully fetched Find My device locations!",
        state.findmy.get_devices().await,
    )
}

async fn refresh_devices(State(state): State<AppState>) -> ApiResult {
    let devices = state
        .findmy
        .refresh_devices()
        .await
        .map_err(|e| ApiError::from_bridge("Failed to refresh Find My device locations!", e))?;
    Success::new("Successfully refreshed Find My device locations!", devices)
}
