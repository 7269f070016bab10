/// Owner of the bytes behind a story's `media_ref`.
///
/// Called once a story row is gone so the file can be released. A reference
/// that no longer resolves to anything must not be reported as an error.
pub trait MediaStore: Send + Sync {
    fn release(&self, media_ref: &str) -> std::io::Result<()>;
}

/// Media held elsewhere; nothing to release.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMedia;

impl MediaStore for NoMedia {
    fn release(&self, _media_ref: &str) -> std::io::Result<()> {
        Ok(())
    }
}
