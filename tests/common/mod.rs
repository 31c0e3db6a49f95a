//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary gallery: artwork images, license files and TOML sources.
pub struct Gallery {
    _temp: TempDir,
    pub root: PathBuf,
}

impl Gallery {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path().canonicalize().expect("canonical temp dir");
        Gallery { _temp: temp, root }
    }

    /// Write `contents` at `relative`, creating parent directories.
    pub fn file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn images(&self, names: &[&str]) -> &Self {
        for name in names {
            self.file(name, "img");
        }
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn uri(&self, relative: &str) -> String {
        uri_of(&self.path(relative))
    }
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new()
    }
}

pub fn uri_of(path: &Path) -> String {
    url::Url::from_file_path(path)
        .expect("absolute path")
        .to_string()
}
