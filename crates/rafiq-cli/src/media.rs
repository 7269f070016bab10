//! Story media kept on local disk under a configured uploads root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use rafiq_core::MediaStore;

pub struct LocalMedia {
    root: PathBuf,
}

impl LocalMedia {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a media reference to a file under the root.
    ///
    /// Accepts bare relative paths (`stories/a.jpg`) and the served URL form
    /// (`http://host/uploads/stories/a.jpg`). URLs outside `/uploads/`, other
    /// schemes, and anything that would escape the root resolve to `None`.
    fn resolve(&self, media_ref: &str) -> Option<PathBuf> {
        let rel = if media_ref.contains("://") {
            extract_url_path(media_ref)?.strip_prefix("uploads/")?
        } else {
            let rel = media_ref.trim_start_matches('/');
            rel.strip_prefix("uploads/").unwrap_or(rel)
        };
        let rel = Path::new(rel);

        let first = rel.components().next()?;
        if first.as_os_str().to_string_lossy().contains(':') {
            return None;
        }
        if rel.components().all(|c| matches!(c, Component::Normal(_))) {
            Some(self.root.join(rel))
        } else {
            None
        }
    }
}

impl MediaStore for LocalMedia {
    fn release(&self, media_ref: &str) -> io::Result<()> {
        let Some(path) = self.resolve(media_ref) else {
            tracing::debug!(media_ref, "media reference outside uploads root, left alone");
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("removed media file {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Path portion of a `scheme://host/path` URL.
fn extract_url_path(url: &str) -> Option<&str> {
    let after_scheme = url.find("://").map(|i| &url[i + 3..])?;
    after_scheme.find('/').map(|i| &after_scheme[i + 1..])
}
