//! Raw directory browsing over the served root.
//!
//! Files (with range requests) are served by `tower_http`'s `ServeDir`.
//! Directories without an `index.html` get a plain link listing, sorted by
//! name, with subdirectories marked by a trailing slash.

use std::path::Path as FsPath;

use askama::Template;
use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::{
    error::{AppError, AppResult},
    routes::paths_helpers::resolve_within,
    state::AppState,
    types::read_entries,
};

struct ListingItem {
    href: String,
    label: String,
}

#[derive(Template)]
#[template(path = "directory.html")]
struct DirectoryTemplate {
    title: String,
    items: Vec<ListingItem>,
}

pub async fn browse_root(State(state): State<AppState>, req: Request) -> Response {
    serve(state, "", req).await
}

pub async fn browse(State(state): State<AppState>, Path(rel): Path<String>, req: Request) -> Response {
    serve(state, &rel, req).await
}

async fn serve(state: AppState, rel: &str, req: Request) -> Response {
    let Some(target) = resolve_within(&state.root, rel) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let is_dir = tokio::fs::metadata(&target).await.map(|m| m.is_dir()).unwrap_or(false);
    if is_dir && !is_file(&target.join("index.html")).await {
        let uri_path = req.uri().path().to_string();
        if !uri_path.ends_with('/') {
            // Relative to the current path, so `//host` style paths cannot redirect off-site
            let last = uri_path.rsplit('/').next().unwrap_or_default();
            return Redirect::permanent(&format!("{}/", last)).into_response();
        }
        return match listing(&target, &uri_path).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => e.into_response(),
        };
    }

    match ServeDir::new(state.root.as_path()).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

async fn listing(dir: &FsPath, title: &str) -> AppResult<String> {
    let mut entries = read_entries(dir).await?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let items = entries
        .into_iter()
        .map(|e| {
            let slash = if e.is_dir { "/" } else { "" };
            ListingItem { href: format!("{}{}", urlencoding::encode(&e.name), slash), label: format!("{}{}", e.name, slash) }
        })
        .collect();

    DirectoryTemplate { title: title.to_string(), items }
        .render()
        .map_err(|e| AppError::Template(format!("directory.html: {}", e)))
}

async fn is_file(path: &FsPath) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}
