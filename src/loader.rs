//! Read TOML metadata sources into a raw [`MetadataDocument`].
//!
//! Top-level tables whose header names artwork files (a file, a directory
//! ending in `/`, or a basename prefix) become per-artwork attributes. Every
//! other top-level key is a global attribute. Headers naming a `.pdf` file are
//! kept aside as standalone certificate tables.
use crate::certificate::{is_certificate_field, CERTIFICATE_EXTENSION};
use crate::collect::{collect_images, is_supported_image};
use crate::document::{ArtworkId, MetadataDocument, PREVIEW_FILE_STEM};
use crate::error::{ConfigurationError, InputWarning, ResolveError, ResolveResult};
use crate::sources::canonical_sources;
use crate::util::{absolute_from, file_stem, has_extension};
use crate::vocabulary;
use serde_json::{Number, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Load and merge `sources` in sorted canonical order.
///
/// Global keys are merged shallowly with the last source winning. Artworks
/// named by several headers merge their tables in declaration order.
pub fn load(sources: &[PathBuf]) -> ResolveResult<MetadataDocument> {
    if sources.is_empty() {
        return Err(ConfigurationError::NoSources.into());
    }
    let mut doc = MetadataDocument {
        sources: canonical_sources(sources),
        ..MetadataDocument::default()
    };
    for source in doc.sources.clone() {
        let table = read_source(&source)?;
        load_table(&mut doc, &source, table)?;
    }
    tracing::info!(
        sources = doc.sources.len(),
        entries = doc.artworks.len(),
        certificate_tables = doc.certificate_tables.len(),
        "loaded metadata sources"
    );
    Ok(doc)
}

fn read_source(path: &Path) -> ResolveResult<toml::Table> {
    let text = fs::read_to_string(path).map_err(|err| ResolveError::io(path, err))?;
    toml::from_str(&text).map_err(|err| ResolveError::Parse {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })
}

fn load_table(doc: &mut MetadataDocument, source: &Path, table: toml::Table) -> ResolveResult<()> {
    let source_dir = source.parent().unwrap_or_else(|| Path::new("/"));
    for (key, value) in table {
        let attributes = match toml_to_json(value) {
            Value::Object(attributes) => attributes,
            scalar => {
                doc.set_global(key, scalar, source_dir);
                continue;
            }
        };

        let matches = resolve_header(source_dir, &key)?;
        if !matches.is_empty() {
            for path in matches {
                let id = ArtworkId::from_path(&path);
                tracing::debug!(header = %key, artwork = %id, "artwork header");
                doc.merge_artwork(id, &attributes, source_dir);
            }
            continue;
        }
        if is_certificate_header(&key) {
            let entry = doc.certificate_tables.entry(key).or_default();
            crate::merge::overlay(entry, &attributes);
            continue;
        }
        if vocabulary::group_of(&key).is_some() || is_certificate_field(&key) {
            doc.set_global(key, Value::Object(attributes), source_dir);
            continue;
        }
        // Dropped: the header names nothing on disk.
        tracing::debug!(header = %key, source = %source.display(), "header matched no artwork");
        doc.warnings.push(InputWarning::UnmatchedHeader {
            source_path: source.to_path_buf(),
            header: key,
        });
    }
    Ok(())
}

/// Artwork files named by a table header, relative to `dir`.
///
/// A trailing `*` is ignored. A trailing `/` lists the images directly in that
/// directory; a name with an extension is a literal file; anything else is a
/// basename prefix matched against the images of its directory. Preview
/// images are kept even before they exist on disk.
pub fn resolve_header(dir: &Path, header: &str) -> ResolveResult<Vec<PathBuf>> {
    let pattern = header.trim();
    let pattern = pattern.strip_suffix('*').unwrap_or(pattern);
    if pattern.is_empty() {
        return Ok(Vec::new());
    }
    let target = absolute_from(dir, Path::new(pattern));

    if pattern.ends_with('/') || pattern.ends_with(std::path::MAIN_SEPARATOR) {
        return collect_images(&target);
    }

    let literal = Path::new(pattern).extension().is_some();
    if literal {
        if file_stem(&target).eq_ignore_ascii_case(PREVIEW_FILE_STEM) && is_supported_image(&target) {
            return Ok(vec![target]);
        }
        return Ok(if target.is_file() && is_supported_image(&target) {
            vec![target]
        } else {
            Vec::new()
        });
    }

    let (Some(parent), Some(prefix)) = (target.parent(), target.file_name()) else {
        return Ok(Vec::new());
    };
    let prefix = prefix.to_string_lossy().to_string();
    Ok(collect_images(parent)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(&prefix))
        })
        .collect())
}

fn is_certificate_header(header: &str) -> bool {
    let header = header.trim();
    let header = header.strip_suffix('*').unwrap_or(header);
    has_extension(Path::new(header), CERTIFICATE_EXTENSION)
}

/// Convert a TOML value into the JSON attribute model.
///
/// Datetimes become their RFC 3339 text; non-finite floats become null.
pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(number) => Value::Number(number.into()),
        toml::Value::Float(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
