//! Resolved metadata document model.
//!
//! A [`MetadataDocument`] holds the global attributes shared by every artwork
//! plus one attribute map per artwork file, keyed by [`ArtworkId`]. Attribute
//! maps are JSON-shaped so they serialize straight into the output document.
use crate::error::InputWarning;
use crate::reference::{file_uri, Reference};
use crate::util::{canonical_or_lexical, file_stem};
use crate::vocabulary::{self, fields};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Field name to value map for one artwork or for the global scope.
pub type Attributes = serde_json::Map<String, Value>;

/// File stem marking an artwork preview image.
pub const PREVIEW_FILE_STEM: &str = "preview";

/// File stem of an artwork working file whose previews sit next to it.
pub const WORKING_FILE_STEM: &str = "artwork";

/// Absolute, normalized path identifying one artwork file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtworkId(PathBuf);

impl ArtworkId {
    /// Identify `path`, canonicalizing as much of it as exists on disk.
    pub fn from_path(path: &Path) -> Self {
        ArtworkId(canonical_or_lexical(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// `file://` URI form used as the key in serialized output.
    pub fn uri(&self) -> String {
        file_uri(&self.0)
    }

    /// Directory containing the artwork file.
    pub fn dir(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Artwork name: the file name without extension.
    pub fn name(&self) -> String {
        file_stem(&self.0)
    }

    pub fn extension(&self) -> Option<String> {
        self.0
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
    }

    fn is_preview_name(&self) -> bool {
        self.name().eq_ignore_ascii_case(PREVIEW_FILE_STEM)
    }

    /// Whether `self` is a preview image of `artwork` by location.
    fn previews(&self, artwork: &ArtworkId) -> bool {
        if !self.is_preview_name() || self == artwork || artwork.is_preview_name() {
            return false;
        }
        let parent = self.dir();
        parent == artwork.dir().join(artwork.name())
            || (artwork.name() == WORKING_FILE_STEM && parent == artwork.dir())
    }
}

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl Serialize for ArtworkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.uri())
    }
}

/// Attributes of one artwork plus the directory of the source declaring it.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ArtworkEntry {
    pub(crate) attributes: Attributes,
    pub(crate) source_dir: PathBuf,
}

/// Certificate state of one artwork after resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum CertificateStatus {
    /// No certificate decision was recorded.
    Unresolved,
    /// The artwork explicitly has no certificate.
    Absent,
    Present { path: PathBuf, attributes: Attributes },
}

/// Global attributes plus one attribute map per artwork.
#[derive(Clone, Debug, Default)]
pub struct MetadataDocument {
    pub(crate) sources: Vec<PathBuf>,
    pub(crate) global: Attributes,
    /// Directory of the source that last set each global key.
    pub(crate) global_origins: BTreeMap<String, PathBuf>,
    pub(crate) artworks: BTreeMap<ArtworkId, ArtworkEntry>,
    /// Tables whose header named a `.pdf` file rather than artworks.
    pub(crate) certificate_tables: BTreeMap<String, Attributes>,
    pub(crate) warnings: Vec<InputWarning>,
}

impl MetadataDocument {
    /// Source files in processing order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn global(&self) -> &Attributes {
        &self.global
    }

    pub fn artwork(&self, id: &ArtworkId) -> Option<&Attributes> {
        self.artworks.get(id).map(|entry| &entry.attributes)
    }

    /// Artworks in sorted order, previews excluded.
    pub fn artwork_ids(&self) -> Vec<ArtworkId> {
        self.artworks
            .keys()
            .filter(|id| self.preview_of(id).is_none())
            .cloned()
            .collect()
    }

    /// The artwork `id` is a preview of, if any.
    pub fn preview_of(&self, id: &ArtworkId) -> Option<ArtworkId> {
        if !id.is_preview_name() {
            return None;
        }
        self.artworks
            .keys()
            .find(|candidate| id.previews(candidate))
            .cloned()
    }

    /// Preview entries attached to `artwork`.
    pub fn previews(&self, artwork: &ArtworkId) -> Vec<ArtworkId> {
        self.artworks
            .keys()
            .filter(|id| id.previews(artwork))
            .cloned()
            .collect()
    }

    /// File extension of the artwork's preview, falling back to its own.
    pub fn preview_extension(&self, artwork: &ArtworkId) -> Option<String> {
        self.previews(artwork)
            .first()
            .and_then(ArtworkId::extension)
            .or_else(|| artwork.extension())
    }

    /// Global attributes overlaid with the artwork's own.
    pub fn effective_attributes(&self, id: &ArtworkId) -> Option<Attributes> {
        let artwork = self.artwork(id)?;
        Some(crate::merge::by_precedence(&[artwork, &self.global]))
    }

    pub fn license(&self, id: &ArtworkId) -> Option<Reference> {
        self.artwork(id)
            .and_then(|attributes| attributes.get(fields::LICENSE))
            .and_then(Reference::from_value)
    }

    pub fn certificate(&self, id: &ArtworkId) -> CertificateStatus {
        match self
            .artwork(id)
            .and_then(|attributes| attributes.get(fields::CERTIFICATE))
        {
            Some(Value::Null) => CertificateStatus::Absent,
            Some(value) => {
                let Some(reference) = Reference::from_value(value) else {
                    return CertificateStatus::Unresolved;
                };
                match reference.path() {
                    Some(path) => CertificateStatus::Present {
                        path: path.to_path_buf(),
                        attributes: reference.attributes().cloned().unwrap_or_default(),
                    },
                    None => CertificateStatus::Unresolved,
                }
            }
            None => CertificateStatus::Unresolved,
        }
    }

    /// Recoverable problems met while building the document.
    pub fn warnings(&self) -> &[InputWarning] {
        &self.warnings
    }

    pub(crate) fn warn(&mut self, warning: InputWarning) {
        tracing::warn!(%warning, "recoverable input problem");
        self.warnings.push(warning);
    }

    pub(crate) fn set_global(&mut self, key: String, value: Value, origin: &Path) {
        self.global_origins.insert(key.clone(), origin.to_path_buf());
        self.global.insert(key, value);
    }

    /// Directory of the source that declared a global key.
    /// Directory relative values of a global key resolve against.
    ///
    /// The source that declared the key under any of its synonyms, else the
    /// last source.
    pub(crate) fn global_origin(&self, key: &str) -> Option<&Path> {
        self.global_origins
            .get(key)
            .or_else(|| {
                vocabulary::synonyms_of(key)
                    .iter()
                    .find_map(|member| self.global_origins.get(*member))
            })
            .map(PathBuf::as_path)
            .or_else(|| self.sources.last().and_then(|source| source.parent()))
    }

    pub(crate) fn merge_artwork(&mut self, id: ArtworkId, attributes: &Attributes, source_dir: &Path) {
        let entry = self.artworks.entry(id).or_default();
        crate::merge::overlay(&mut entry.attributes, attributes);
        entry.source_dir = source_dir.to_path_buf();
    }

    /// The document with every artwork flattened onto the global attributes.
    pub fn flattened(&self) -> FlattenedDocument<'_> {
        FlattenedDocument(self)
    }
}

impl Serialize for MetadataDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let artworks: BTreeMap<String, &Attributes> = self
            .artworks
            .iter()
            .map(|(id, entry)| (id.uri(), &entry.attributes))
            .collect();
        let sources: Vec<String> = self.sources.iter().map(|path| file_uri(path)).collect();
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("sources", &sources)?;
        map.serialize_entry("global", &self.global)?;
        map.serialize_entry("artworks", &artworks)?;
        map.serialize_entry("warnings", &self.warnings)?;
        map.end()
    }
}

/// Serialization view mapping each artwork URI to its effective attributes.
pub struct FlattenedDocument<'a>(&'a MetadataDocument);

impl Serialize for FlattenedDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ids = self.0.artwork_ids();
        let mut map = serializer.serialize_map(Some(ids.len()))?;
        for id in ids {
            let attributes = self.0.effective_attributes(&id).unwrap_or_default();
            map.serialize_entry(&id.uri(), &attributes)?;
        }
        map.end()
    }
}
