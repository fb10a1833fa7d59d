use axum::{
    extract::State,
    http::header::CACHE_CONTROL,
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, error, info};

use crate::{
    error::AppResult,
    state::AppState,
    types::{read_entries, PlaylistEntry},
};

/// The media page: optional aggregation pass, then one player per media file
/// directly inside the served root, in directory-listing order.
///
/// Nothing is cached; every request re-reads the directory. Aggregation and
/// listing failures are logged and the page is still served.
pub async fn media_page(State(state): State<AppState>) -> AppResult<Response> {
    if let Some(agg) = state.aggregator.clone() {
        // Detached so a client hanging up does not kill ffmpeg mid-write
        if let Err(e) = tokio::spawn(async move { agg.aggregate_root().await }).await {
            error!("aggregation pass aborted: {}", e);
        }
    }

    let root = state.root.as_path();
    let entries = match read_entries(root).await {
        Ok(entries) => entries,
        Err(e) => {
            state.metrics.inc_unreadable_dirs();
            error!("could not open directory '{}': {}", root.display(), e);
            Vec::new()
        }
    };

    let mut playlist = Vec::with_capacity(entries.len());
    for e in entries {
        if e.is_dir {
            info!("skipping directory '{}'", e.name);
            continue;
        }
        let entry = PlaylistEntry::new(e.name);
        if !entry.kind.is_playable() {
            info!("skipping file '{}'", entry.name);
            continue;
        }
        debug!("handled file {}", entry.name);
        playlist.push(entry);
    }

    let html = state.renderer.render(&playlist)?;
    state.metrics.inc_pages_rendered();
    Ok(([(CACHE_CONTROL, "no-store")], Html(html)).into_response())
}
