use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::StopmoResult;

/// Scan `dir` for image files, in lexicographic path order.
///
/// Only entries whose extension the `image` crate recognizes are kept. The
/// resulting order is the canonical frame order for the session. An empty
/// result is not an error; the caller decides how to report it.
pub fn scan_images(dir: &Path) -> StopmoResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read image directory '{}'", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if image::ImageFormat::from_path(&path).is_ok() {
            paths.push(path);
        }
    }

    paths.sort();
    tracing::debug!(count = paths.len(), "scanned {}", dir.display());
    Ok(paths)
}
