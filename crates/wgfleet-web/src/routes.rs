//! Route wiring for the delivery server.

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::download_peer_config;
use crate::state::AppState;

/// Builds the delivery router.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/peers/{secret}", get(download_peer_config))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
