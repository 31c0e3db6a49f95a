//! Pointers to license and certificate documents.
use crate::document::Attributes;
use serde_json::Value;
use std::path::{Path, PathBuf};
use url::Url;

/// A license or certificate reference as it appears in attribute maps.
#[derive(Clone, Debug, PartialEq)]
pub enum Reference {
    /// A raw string that is neither a URL nor a resolved file yet.
    Scalar(String),
    /// A remote URL, trusted as-is.
    RemoteUrl(String),
    /// A local file, stored as a `file://` URI.
    LocalFile(PathBuf),
    /// A file plus inline attributes: `{ "<uri>" = { ... } }`.
    InlineTable(PathBuf, Attributes),
}

impl Reference {
    /// Classify a raw string.
    pub fn parse(text: &str) -> Reference {
        let text = text.trim();
        if let Some(path) = path_from_file_uri(text) {
            return Reference::LocalFile(path);
        }
        if is_remote_url(text) {
            return Reference::RemoteUrl(text.to_string());
        }
        Reference::Scalar(text.to_string())
    }

    /// Read a reference back from an attribute value.
    ///
    /// Returns `None` for values that cannot be a reference: empty values,
    /// numbers, lists, and tables that are not a single `path -> table` entry.
    pub fn from_value(value: &Value) -> Option<Reference> {
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(Reference::parse(text)),
            Value::Object(map) if map.len() == 1 => {
                let (key, inner) = map.iter().next()?;
                let attributes = inner.as_object()?.clone();
                let path = path_from_file_uri(key).unwrap_or_else(|| PathBuf::from(key.trim()));
                Some(Reference::InlineTable(path, attributes))
            }
            _ => None,
        }
    }

    /// The attribute value for this reference.
    pub fn to_value(&self) -> Value {
        match self {
            Reference::Scalar(text) | Reference::RemoteUrl(text) => Value::String(text.clone()),
            Reference::LocalFile(path) => Value::String(file_uri(path)),
            Reference::InlineTable(path, attributes) => {
                let mut map = Attributes::new();
                map.insert(file_uri(path), Value::Object(attributes.clone()));
                Value::Object(map)
            }
        }
    }

    /// The referenced location as a string: URL, `file://` URI or raw text.
    pub fn target(&self) -> String {
        match self {
            Reference::Scalar(text) | Reference::RemoteUrl(text) => text.clone(),
            Reference::LocalFile(path) | Reference::InlineTable(path, _) => file_uri(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Reference::LocalFile(path) | Reference::InlineTable(path, _) => Some(path),
            Reference::Scalar(_) | Reference::RemoteUrl(_) => None,
        }
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            Reference::InlineTable(_, attributes) => Some(attributes),
            _ => None,
        }
    }

    /// Last path segment of the target, used for file-name conventions.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Reference::LocalFile(path) | Reference::InlineTable(path, _) => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string()),
            Reference::RemoteUrl(text) => Url::parse(text).ok().and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
                    .map(str::to_string)
            }),
            Reference::Scalar(text) => Path::new(text)
                .file_name()
                .map(|name| name.to_string_lossy().to_string()),
        }
    }
}

/// `file://` URI for an absolute path.
pub fn file_uri(path: &Path) -> String {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

/// Local path of a `file://` URI, or `None` for anything else.
pub fn path_from_file_uri(text: &str) -> Option<PathBuf> {
    let url = Url::parse(text.trim()).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

/// Whether `text` is a syntactically valid URL with a non-file scheme.
///
/// Single-letter schemes are rejected so Windows drive paths stay paths.
pub fn is_remote_url(text: &str) -> bool {
    Url::parse(text.trim())
        .map(|url| url.scheme().len() > 1 && url.scheme() != "file")
        .unwrap_or(false)
}
