use std::path::{Component, Path, PathBuf};

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

/// Resolve `path` against `base` and fold `.`/`..` without touching the disk.
pub fn absolute_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Canonicalize when the file exists, otherwise canonicalize the closest
/// existing parent and re-append the rest.
pub fn canonical_or_lexical(path: &Path) -> PathBuf {
    let lexical = normalize_lexically(path);
    if let Ok(canonical) = lexical.canonicalize() {
        return canonical;
    }
    match (lexical.parent(), lexical.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            canonical_or_lexical(parent).join(name)
        }
        _ => lexical,
    }
}

/// Drop leading `./` components from a relative path.
pub fn strip_current_dir(path: &Path) -> PathBuf {
    path.components()
        .skip_while(|component| matches!(component, Component::CurDir))
        .collect()
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}
