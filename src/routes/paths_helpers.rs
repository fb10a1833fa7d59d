// Helper functions for mapping request paths onto the served root

use std::path::{Component, Path, PathBuf};

/// Joins the decoded request path `rel` onto `root`.
///
/// Returns `None` for anything that could leave the root (`..`, drive
/// prefixes). Leading slashes and `.` segments are ignored.
pub fn resolve_within(root: &Path, rel: &str) -> Option<PathBuf> {
    if rel.contains('\0') {
        return None;
    }
    let mut out = root.to_path_buf();
    for comp in Path::new(rel).components() {
        match comp {
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_plain_segments() {
        let root = Path::new("/srv/music");
        assert_eq!(resolve_within(root, "album/a.mp3"), Some(PathBuf::from("/srv/music/album/a.mp3")));
        assert_eq!(resolve_within(root, "/album/./b.mp3"), Some(PathBuf::from("/srv/music/album/b.mp3")));
        assert_eq!(resolve_within(root, ""), Some(PathBuf::from("/srv/music")));
    }

    #[test]
    fn rejects_traversal() {
        let root = Path::new("/srv/music");
        assert_eq!(resolve_within(root, "../etc/passwd"), None);
        assert_eq!(resolve_within(root, "album/../../x"), None);
        assert_eq!(resolve_within(root, "a\0b"), None);
    }
}
