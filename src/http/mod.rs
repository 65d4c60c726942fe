//! HTTP API
//!
//! Everything is served under `/api/v1`.

mod contacts;
mod findmy;
pub mod response;
mod state;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub use response::{ApiError, ApiResult, ErrorType, Success};
pub use state::AppState;

/// Path prefix for every route.
pub const API_PREFIX: &str = "/api/v1";

pub fn router(state: AppState) -> Router {
    let api = Router::new().merge(findmy::routes()).merge(contacts::routes());
    Router::new().nest(API_PREFIX, api).with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
