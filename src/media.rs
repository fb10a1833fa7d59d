//! Media classification by file extension.
//!
//! Matching is exact and case-sensitive: `song.MP3` is not audio.

use serde::Serialize;

/// Extensions (including the leading dot) treated as audio.
pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".flac", ".wav", ".webm"];

/// Extensions (including the leading dot) treated as video.
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
    Unrecognized,
}

impl MediaKind {
    /// The `type` attribute emitted on the player element.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            MediaKind::Audio => Some("audio/mpeg"),
            MediaKind::Video => Some("video/mp4"),
            MediaKind::Unrecognized => None,
        }
    }

    pub fn is_playable(&self) -> bool {
        !matches!(self, MediaKind::Unrecognized)
    }
}

/// Returns the extension of `name` starting at its final dot, or `""`.
pub fn extension_of(name: &str) -> &str {
    name.rfind('.').map(|idx| &name[idx..]).unwrap_or("")
}

pub fn classify(name: &str) -> MediaKind {
    let ext = extension_of(name);
    if AUDIO_EXTENSIONS.contains(&ext) {
        MediaKind::Audio
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        MediaKind::Video
    } else {
        MediaKind::Unrecognized
    }
}
