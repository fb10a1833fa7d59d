//! HTTP route handlers.
//!
//! - `browse`: the served directory tree as static files (`/`)
//! - `media`: the generated player page (default `/st`)
//! - `health`: liveness, version and metrics endpoints
//! - `paths_helpers`: mapping request paths onto the served root

pub mod browse;
pub mod health;
pub mod media;
pub mod paths_helpers;

use axum::{middleware::from_fn, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{middleware, state::AppState};

/// Builds the complete application router for `state`.
pub fn router(state: AppState) -> Router {
    let media_route = state.config.server.media_route.clone();

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/version", get(health::version))
        .route("/metrics", get(health::metrics))
        .route(&media_route, get(media::media_page))
        .route("/", get(browse::browse_root))
        .route("/{*path}", get(browse::browse))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::response_headers_middleware))
}
