use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::media::MediaKind;

/// A single entry of a directory read. Never cached; every caller re-reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// A classified direct child of the served root, as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistEntry {
    pub name: String,
    pub kind: MediaKind,
}

impl PlaylistEntry {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = crate::media::classify(&name);
        Self { name, kind }
    }

    pub fn is_audio(&self) -> bool {
        self.kind == MediaKind::Audio
    }
}

/// Lists the direct children of `dir` in the order the filesystem returns them.
///
/// Entries whose file type cannot be determined are dropped. The order is
/// implementation-defined and deliberately not re-sorted.
pub async fn read_entries(dir: &Path) -> std::io::Result<Vec<DirectoryEntry>> {
    let mut rd = tokio::fs::read_dir(dir).await?;
    let mut out = Vec::new();
    while let Some(entry) = rd.next_entry().await? {
        let ft = match entry.file_type().await {
            Ok(ft) => ft,
            Err(e) => {
                tracing::warn!("failed to stat {}: {}", entry.path().display(), e);
                continue;
            }
        };
        out.push(DirectoryEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            path: entry.path(),
            is_dir: ft.is_dir(),
        });
    }
    Ok(out)
}
