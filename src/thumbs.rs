use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::{StopmoError, StopmoResult};

/// Bounding box for generated thumbnails (aspect ratio is preserved).
pub const THUMB_MAX_DIM: u32 = 250;

/// Lazily-populated thumbnail cache: one file per source image, named after
/// the source file name. File presence alone is the validity signal; there
/// is no staleness check against the source's modification time.
#[derive(Clone, Debug)]
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache path a source image maps to.
    pub fn thumb_path(&self, source: &Path) -> StopmoResult<PathBuf> {
        let name = source.file_name().ok_or_else(|| {
            StopmoError::asset(format!(
                "image path '{}' has no file name",
                source.display()
            ))
        })?;
        Ok(self.dir.join(name))
    }

    /// Return the thumbnail for `source`, generating it on first request.
    pub fn get_or_create(&self, source: &Path) -> StopmoResult<PathBuf> {
        let thumb = self.thumb_path(source)?;
        if thumb.exists() {
            return Ok(thumb);
        }

        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create thumbnail dir '{}'", self.dir.display())
        })?;

        let img = image::open(source).map_err(|e| {
            StopmoError::asset(format!("failed to load image '{}': {e}", source.display()))
        })?;
        // Shrink-only: an image already inside the box is kept at its size.
        let small = if img.width() <= THUMB_MAX_DIM && img.height() <= THUMB_MAX_DIM {
            img
        } else {
            img.thumbnail(THUMB_MAX_DIM, THUMB_MAX_DIM)
        };
        small.save(&thumb).map_err(|e| {
            StopmoError::asset(format!(
                "failed to write thumbnail '{}': {e}",
                thumb.display()
            ))
        })?;

        tracing::debug!("thumbnailed {} -> {}", source.display(), thumb.display());
        Ok(thumb)
    }
}
