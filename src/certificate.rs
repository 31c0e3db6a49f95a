//! Certificate of authenticity references.
//!
//! Each artwork ends with exactly one of: a certificate reference stored as
//! `{ "<file uri>" = { ...attributes } }`, or an explicit absence stored as
//! `null`. Declarations come from the artwork itself, from standalone tables
//! whose header names a `.pdf` file, or from the global certificate field.
//!
//! Resolution runs in stages over a scratch view of the document and only
//! writes back once every stage has succeeded:
//!
//! 1. read declarations from the artwork and global certificate fields,
//! 2. anchor relative paths under `<dir>/<artwork>/`,
//! 3. attach standalone tables to artworks,
//! 4. default the artworks that are still undeclared,
//! 5. merge attributes (standalone over inline over defaults),
//! 6. fill PDF info tags.
use crate::document::{ArtworkId, Attributes, MetadataDocument};
use crate::error::{ConfigurationError, InputWarning, ResolveResult};
use crate::merge;
use crate::reference::{is_remote_url, path_from_file_uri, Reference};
use crate::util::{has_extension, normalize_lexically, strip_current_dir};
use crate::vocabulary::{self, fields};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const CERTIFICATE_FILE_STEM: &str = "certificate";
pub const CERTIFICATE_EXTENSION: &str = "pdf";
pub const DEFAULT_TITLE: &str = "Certificate of Authenticity";

/// PDF document info tags written into certificates.
pub const INFO_TAGS: &[&str] = &["Title", "Author", "Subject", "Keywords"];

/// Namespace of PDF info tags given explicitly.
pub const PDF_NAMESPACE: &str = "XMP-pdf:";

const ALIASES: &[&str] = &["certificate", "coa", "certificate_of_authenticity"];

const TITLE: &str = "Title";
const AUTHOR: &str = "Author";

/// Whether `key` names the certificate field under any accepted spelling.
pub fn is_certificate_field(key: &str) -> bool {
    let key = key.trim();
    key.eq_ignore_ascii_case(fields::CERTIFICATE)
        || ALIASES.iter().any(|alias| alias.eq_ignore_ascii_case(key))
}

/// `certificate.pdf`
pub fn default_file_name() -> String {
    format!("{CERTIFICATE_FILE_STEM}.{CERTIFICATE_EXTENSION}")
}

/// Normalize certificate attribute names.
///
/// Info tags are capitalized, `XMP-pdf:` keys keep the namespace with a
/// capitalized tag, and every other key is lower-cased.
pub fn normalize_certificate_keys(attributes: &Attributes) -> Attributes {
    attributes
        .iter()
        .map(|(key, value)| (certificate_key(key), value.clone()))
        .collect()
}

fn certificate_key(key: &str) -> String {
    let key = key.trim();
    let capitalized = capitalize(key);
    if INFO_TAGS.contains(&capitalized.as_str()) {
        return capitalized;
    }
    let namespace = key
        .get(..PDF_NAMESPACE.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PDF_NAMESPACE));
    if namespace {
        return format!("{PDF_NAMESPACE}{}", capitalize(&key[PDF_NAMESPACE.len()..]));
    }
    key.to_lowercase()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// A certificate declaration as written by the author.
#[derive(Debug, PartialEq)]
enum Declaration {
    Missing,
    /// Empty value: the author opted out.
    Empty,
    Path { raw: String, inline: Attributes },
    /// A table of attributes without a path: use the default location.
    AttributesOnly(Attributes),
    Invalid(String),
}

fn declared_value(attributes: &Attributes) -> Option<&Value> {
    attributes.get(fields::CERTIFICATE).or_else(|| {
        ALIASES.iter().find_map(|alias| {
            attributes
                .iter()
                .find(|(key, _)| key.trim().eq_ignore_ascii_case(alias))
                .map(|(_, value)| value)
        })
    })
}

fn parse_declaration(value: Option<&Value>) -> Declaration {
    let Some(value) = value else {
        return Declaration::Missing;
    };
    if vocabulary::is_empty(value) || *value == Value::Bool(false) {
        return Declaration::Empty;
    }
    match value {
        Value::String(text) => Declaration::Path {
            raw: text.trim().to_string(),
            inline: Attributes::new(),
        },
        Value::Object(map) => match Reference::from_value(value) {
            Some(Reference::InlineTable(_, inline)) => {
                let raw = map.keys().next().cloned().unwrap_or_default();
                Declaration::Path {
                    raw: raw.trim().to_string(),
                    inline: normalize_certificate_keys(&inline),
                }
            }
            _ if map.values().all(|inner| !inner.is_object()) => {
                Declaration::AttributesOnly(normalize_certificate_keys(map))
            }
            _ => Declaration::Invalid(value.to_string()),
        },
        other => Declaration::Invalid(other.to_string()),
    }
}

/// The global certificate setting.
#[derive(Debug, PartialEq)]
enum GlobalCertificate {
    Undeclared,
    /// Explicitly empty: artworks without their own declaration get none.
    ForceAbsent,
    Declared { raw: String, inline: Attributes },
}

fn global_certificate(global: &Attributes, warnings: &mut Vec<InputWarning>) -> GlobalCertificate {
    let unsupported = |value: String, warnings: &mut Vec<InputWarning>| {
        warnings.push(InputWarning::UnsupportedGlobalCertificate {
            value,
            fallback: default_file_name(),
        });
    };
    match parse_declaration(declared_value(global)) {
        Declaration::Missing => GlobalCertificate::Undeclared,
        Declaration::Empty => GlobalCertificate::ForceAbsent,
        Declaration::Path { raw, inline } => {
            let local = path_from_file_uri(&raw).unwrap_or_else(|| PathBuf::from(&raw));
            if is_remote_url(&raw) || !has_extension(&local, CERTIFICATE_EXTENSION) {
                unsupported(raw, warnings);
                GlobalCertificate::Declared {
                    raw: default_file_name(),
                    inline,
                }
            } else {
                GlobalCertificate::Declared { raw, inline }
            }
        }
        Declaration::AttributesOnly(inline) => GlobalCertificate::Declared {
            raw: default_file_name(),
            inline,
        },
        Declaration::Invalid(text) => {
            unsupported(text, warnings);
            GlobalCertificate::Undeclared
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Slot {
    Undeclared,
    Absent,
    Declared { path: PathBuf, inline: Attributes },
}

struct Candidate {
    id: ArtworkId,
    dir: PathBuf,
    name: String,
    slot: Slot,
}

impl Candidate {
    fn new(id: ArtworkId, attributes: &Attributes, warnings: &mut Vec<InputWarning>) -> Self {
        let dir = id.dir().to_path_buf();
        let name = id.name();
        let slot = match parse_declaration(declared_value(attributes)) {
            Declaration::Missing => Slot::Undeclared,
            Declaration::Empty => Slot::Absent,
            Declaration::Path { raw, inline } => match anchor(&raw, &dir, &name) {
                Some(path) => Slot::Declared { path, inline },
                None => {
                    warnings.push(InputWarning::IgnoredCertificate {
                        artwork: id.uri(),
                        value: raw,
                    });
                    Slot::Undeclared
                }
            },
            Declaration::AttributesOnly(inline) => Slot::Declared {
                path: default_path(&dir, &name),
                inline,
            },
            Declaration::Invalid(value) => {
                warnings.push(InputWarning::IgnoredCertificate {
                    artwork: id.uri(),
                    value,
                });
                Slot::Undeclared
            }
        };
        Candidate {
            id,
            dir,
            name,
            slot,
        }
    }

    fn artwork_dir(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// `<dir>/<name>/certificate.pdf`
pub fn default_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name).join(default_file_name())
}

/// Absolute path of an artwork-level declaration, or `None` when it is not a
/// local `.pdf` file.
///
/// Relative paths are anchored under `<dir>/<name>/` unless their parent
/// directory is already named after the artwork.
fn anchor(raw: &str, dir: &Path, name: &str) -> Option<PathBuf> {
    let path = match path_from_file_uri(raw) {
        Some(path) => path,
        None if is_remote_url(raw) => return None,
        None if Path::new(raw).is_absolute() => PathBuf::from(raw),
        None => {
            let relative = strip_current_dir(Path::new(raw));
            let file_name = relative.file_name()?;
            let parent = relative.parent().unwrap_or_else(|| Path::new(""));
            if parent.file_name() == Some(OsStr::new(name)) {
                dir.join(&relative)
            } else {
                dir.join(parent).join(name).join(file_name)
            }
        }
    };
    has_extension(&path, CERTIFICATE_EXTENSION).then(|| normalize_lexically(&path))
}

/// Path for an artwork defaulted from the global declaration.
fn global_path(raw: &str, dir: &Path, name: &str) -> PathBuf {
    let path = match path_from_file_uri(raw) {
        Some(path) => path,
        None if Path::new(raw).is_absolute() => PathBuf::from(raw),
        None => dir.join(name).join(strip_current_dir(Path::new(raw))),
    };
    normalize_lexically(&path)
}

enum Attachment {
    Absorbed(Vec<PathBuf>),
    Waived,
}

enum Action {
    Attach(PathBuf),
    Claim(PathBuf),
    Waive,
    Skip,
}

/// Attach one standalone table to the artworks it names.
///
/// Absolute headers attach to the artwork declaring that path, else to an
/// undeclared artwork whose directory contains it. Relative headers must end
/// in `<artwork>/<file>.pdf`; they attach to artworks of that name by file
/// name, at `<dir>/<artwork>/<file>.pdf`.
fn attach_table(
    header: &str,
    candidates: &mut [Candidate],
    force_absent: bool,
) -> Result<Attachment, ConfigurationError> {
    let header_path =
        path_from_file_uri(header).unwrap_or_else(|| PathBuf::from(header.trim()));
    let mut attached = Vec::new();
    let mut waived = false;

    let mut apply = |candidate: &mut Candidate, action: Action, attached: &mut Vec<PathBuf>| match action {
        Action::Attach(path) => attached.push(path),
        Action::Claim(path) => {
            tracing::debug!(artwork = %candidate.id, table = %header, "certificate claimed by table");
            candidate.slot = Slot::Declared {
                path: path.clone(),
                inline: Attributes::new(),
            };
            attached.push(path);
        }
        Action::Waive => waived = true,
        Action::Skip => {}
    };

    if header_path.is_absolute() {
        let target = normalize_lexically(&header_path);
        for candidate in candidates.iter() {
            if matches!(&candidate.slot, Slot::Declared { path, .. } if *path == target) {
                attached.push(target.clone());
            }
        }
        if attached.is_empty() {
            let parent = target.parent().map(Path::to_path_buf);
            for candidate in candidates.iter_mut() {
                let related = parent.as_deref() == Some(candidate.artwork_dir().as_path())
                    || parent.as_deref() == Some(candidate.dir.as_path());
                if !related {
                    continue;
                }
                let action = match &candidate.slot {
                    Slot::Undeclared if force_absent => Action::Waive,
                    Slot::Undeclared => Action::Claim(target.clone()),
                    Slot::Absent => Action::Waive,
                    Slot::Declared { .. } => Action::Skip,
                };
                apply(candidate, action, &mut attached);
            }
        }
    } else {
        let relative = strip_current_dir(&header_path);
        let context = relative
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty() && name != "." && name != "..");
        let Some(context) = context else {
            return Err(ConfigurationError::CertificateContext {
                header: header.to_string(),
            });
        };
        let Some(file_name) = relative.file_name() else {
            return Err(ConfigurationError::CertificateContext {
                header: header.to_string(),
            });
        };
        for candidate in candidates.iter_mut().filter(|candidate| candidate.name == context) {
            // Leading segments only navigate from the source to the artwork.
            let expected = candidate.artwork_dir().join(file_name);
            let action = match &candidate.slot {
                Slot::Declared { path, .. }
                    if *path == expected || path.file_name() == Some(file_name) =>
                {
                    Action::Attach(path.clone())
                }
                Slot::Declared { .. } => Action::Skip,
                Slot::Undeclared if force_absent => Action::Waive,
                Slot::Undeclared => Action::Claim(expected),
                Slot::Absent => Action::Waive,
            };
            apply(candidate, action, &mut attached);
        }
    }

    if !attached.is_empty() {
        Ok(Attachment::Absorbed(attached))
    } else if waived {
        Ok(Attachment::Waived)
    } else {
        Err(ConfigurationError::UnmatchedCertificateTable {
            header: header.to_string(),
        })
    }
}

/// Fill PDF info tags: `XMP-pdf:<Tag>` replaces `<Tag>`, `Title` defaults to
/// the standard title and `Author` to the artwork's creator.
pub fn apply_info_defaults(attributes: &mut Attributes, creator: Option<&str>) {
    for tag in INFO_TAGS {
        if let Some(value) = attributes.remove(&format!("{PDF_NAMESPACE}{tag}")) {
            attributes.insert((*tag).to_string(), value);
        }
    }
    let unset = |attributes: &Attributes, tag: &str| {
        !attributes
            .get(tag)
            .is_some_and(|value| !vocabulary::is_empty(value))
    };
    if unset(attributes, TITLE) {
        attributes.insert(TITLE.to_string(), Value::String(DEFAULT_TITLE.to_string()));
    }
    if let Some(creator) = creator.filter(|creator| !creator.trim().is_empty()) {
        if unset(attributes, AUTHOR) {
            attributes.insert(AUTHOR.to_string(), Value::String(creator.to_string()));
        }
    }
}

fn creator_of(doc: &MetadataDocument, id: &ArtworkId) -> Option<String> {
    let value = doc
        .artwork(id)
        .and_then(|attributes| attributes.get(fields::CREATOR))
        .or_else(|| doc.global.get(fields::CREATOR))?;
    let names = vocabulary::display_names(value);
    (!names.is_empty()).then(|| names.join(", "))
}

fn strip_certificate_fields(attributes: &mut Attributes) {
    attributes.retain(|key, _| !is_certificate_field(key));
}

/// Resolve every artwork's certificate.
///
/// On error the document is left untouched.
pub fn resolve_certificates(doc: &mut MetadataDocument) -> ResolveResult<()> {
    let mut warnings = Vec::new();
    let global = global_certificate(&doc.global, &mut warnings);
    let force_absent = global == GlobalCertificate::ForceAbsent;

    let mut candidates: Vec<Candidate> = doc
        .artwork_ids()
        .into_iter()
        .filter_map(|id| {
            let attributes = doc.artwork(&id)?;
            Some(Candidate::new(id, attributes, &mut warnings))
        })
        .collect();

    let mut standalone: BTreeMap<PathBuf, Attributes> = BTreeMap::new();
    for (header, table) in &doc.certificate_tables {
        let table = normalize_certificate_keys(table);
        match attach_table(header, &mut candidates, force_absent)? {
            Attachment::Absorbed(paths) => {
                for path in paths {
                    merge::overlay(standalone.entry(path).or_default(), &table);
                }
            }
            Attachment::Waived => {
                tracing::debug!(table = %header, "certificate table waived by opted-out artworks");
            }
        }
    }

    for candidate in candidates.iter_mut() {
        if candidate.slot != Slot::Undeclared {
            continue;
        }
        candidate.slot = match &global {
            GlobalCertificate::ForceAbsent => Slot::Absent,
            GlobalCertificate::Declared { raw, inline } => Slot::Declared {
                path: global_path(raw, &candidate.dir, &candidate.name),
                inline: inline.clone(),
            },
            GlobalCertificate::Undeclared => Slot::Declared {
                path: default_path(&candidate.dir, &candidate.name),
                inline: Attributes::new(),
            },
        };
    }

    let empty = Attributes::new();
    let mut resolved: Vec<(ArtworkId, Value)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let value = match candidate.slot {
            Slot::Declared { path, inline } => {
                let table = standalone.get(&path).unwrap_or(&empty);
                let mut merged = merge::by_precedence(&[table, &inline]);
                apply_info_defaults(&mut merged, creator_of(doc, &candidate.id).as_deref());
                tracing::debug!(artwork = %candidate.id, certificate = %path.display(), "certificate resolved");
                Reference::InlineTable(path, merged).to_value()
            }
            Slot::Absent | Slot::Undeclared => {
                tracing::debug!(artwork = %candidate.id, "certificate absent");
                Value::Null
            }
        };
        resolved.push((candidate.id, value));
    }

    let present = resolved.iter().filter(|(_, value)| !value.is_null()).count();
    for (id, value) in resolved {
        if let Some(entry) = doc.artworks.get_mut(&id) {
            strip_certificate_fields(&mut entry.attributes);
            entry
                .attributes
                .insert(fields::CERTIFICATE.to_string(), value);
        }
    }
    strip_certificate_fields(&mut doc.global);
    doc.global_origins.retain(|key, _| !is_certificate_field(key));
    doc.certificate_tables.clear();
    for warning in warnings {
        doc.warn(warning);
    }
    tracing::info!(
        present,
        absent = doc.artwork_ids().len() - present,
        "resolved certificates"
    );
    Ok(())
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod tests;
