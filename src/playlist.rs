//! Media page rendering.
//!
//! The page is a fixed document shell with one player block per playable
//! entry. File names go through the template engine's HTML escaping, so a
//! name cannot break out of its attribute or inject markup.

use askama::Template;

use crate::error::{AppError, AppResult};
use crate::types::PlaylistEntry;

struct PlayerItem<'a> {
    name: &'a str,
    src: String,
    audio: bool,
    mime: &'static str,
}

#[derive(Template)]
#[template(path = "media_page.html")]
struct MediaPageTemplate<'a> {
    items: Vec<PlayerItem<'a>>,
}

/// Renders classified entries into the media page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaylistRenderer;

impl PlaylistRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Renders `entries` in input order; unrecognized entries are omitted.
    /// An empty slice yields the bare document shell.
    pub fn render(&self, entries: &[PlaylistEntry]) -> AppResult<String> {
        let items = entries
            .iter()
            .filter_map(|e| {
                e.kind.mime_type().map(|mime| PlayerItem {
                    name: e.name.as_str(),
                    src: urlencoding::encode(&e.name).into_owned(),
                    audio: e.is_audio(),
                    mime,
                })
            })
            .collect();
        MediaPageTemplate { items }
            .render()
            .map_err(|e| AppError::Template(format!("media_page.html: {}", e)))
    }
}
