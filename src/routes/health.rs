use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// Liveness probe; does not touch the served tree.
pub async fn healthz() -> &'static str {
    "ok"
}

/// Counter snapshot as JSON.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

/// Name, version and the features this instance runs with.
pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "features": {
            "aggregation": state.aggregator.is_some(),
            "media_route": state.config.server.media_route,
            "ffmpeg_path": state.aggregator.as_ref().map(|_| state.config.aggregator.ffmpeg_path.as_str()),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "target": format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
        }
    }))
}
