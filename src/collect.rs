//! Directory listing for artwork and source discovery.
use crate::error::{ResolveError, ResolveResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Image formats recognized as artworks.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "tiff", "tif", "webp", "heic", "heif",
];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy();
        SUPPORTED_IMAGE_EXTENSIONS
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(&ext))
    })
}

/// Files under `root` accepted by `filter`, descending at most `depth`
/// directory levels. A file path is returned as-is when it passes the filter.
///
/// Hidden entries are skipped. A missing root yields no files.
pub fn collect_files(
    root: &Path,
    depth: usize,
    filter: &dyn Fn(&Path) -> bool,
) -> ResolveResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    if root.is_file() {
        if filter(root) {
            files.push(root.to_path_buf());
        }
        return Ok(files);
    }
    if !root.is_dir() {
        return Ok(files);
    }
    let entries = fs::read_dir(root).map_err(|err| ResolveError::io(root, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| ResolveError::io(root, err))?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if depth > 0 {
                files.extend(collect_files(&path, depth - 1, filter)?);
            }
        } else if path.is_file() && filter(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Artwork images directly inside `root` (or `root` itself).
pub fn collect_images(root: &Path) -> ResolveResult<Vec<PathBuf>> {
    collect_files(root, 0, &is_supported_image)
}
