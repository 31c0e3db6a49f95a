//! Source file discovery and cache keys.
use crate::collect::collect_files;
use crate::error::{ConfigurationError, ResolveError, ResolveResult};
use crate::util::{canonical_or_lexical, has_extension};
use std::fmt;
use std::path::{Path, PathBuf};

pub const SOURCE_EXTENSION: &str = "toml";
const KEY_SEPARATOR: &str = "|";

/// Identity of a set of sources, independent of argument order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_sources(sources: &[PathBuf]) -> Self {
        let parts: Vec<String> = canonical_sources(sources)
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        CacheKey(parts.join(KEY_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical, sorted and de-duplicated source paths.
pub fn canonical_sources(sources: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = sources
        .iter()
        .map(|path| canonical_or_lexical(path))
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

/// Expand command-line arguments into source files.
///
/// Directories contribute the `.toml` files directly inside them; files are
/// taken as given. A missing path is an I/O error.
pub fn discover(arguments: &[PathBuf]) -> ResolveResult<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for argument in arguments {
        if argument.is_dir() {
            let found = collect_files(argument, 0, &|path: &Path| {
                has_extension(path, SOURCE_EXTENSION)
            })?;
            tracing::debug!(dir = %argument.display(), count = found.len(), "discovered sources");
            sources.extend(found);
        } else if argument.is_file() {
            sources.push(argument.clone());
        } else {
            return Err(ResolveError::io(
                argument,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
    }
    if sources.is_empty() {
        return Err(ConfigurationError::NoSources.into());
    }
    Ok(canonical_sources(&sources))
}
