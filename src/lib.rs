//! Provenance metadata resolution for NFT-bound digital artworks.
//!
//! Metadata is authored as TOML next to the artwork images. Resolution loads
//! the sources, normalizes field names across the XMP, EXIF, schema.org and
//! token vocabularies, resolves license and certificate references per
//! artwork, and fills document defaults. [`Resolver`] caches the result per
//! source set.
pub mod certificate;
pub mod collect;
pub mod defaults;
pub mod document;
pub mod error;
pub mod license;
pub mod loader;
pub mod merge;
pub mod normalize;
pub mod reference;
pub mod resolver;
pub mod sources;
pub mod util;
pub mod vocabulary;

pub use document::{ArtworkId, Attributes, CertificateStatus, MetadataDocument};
pub use error::{ConfigurationError, InputWarning, ResolveError, ResolveResult};
pub use reference::Reference;
pub use resolver::{build, Resolver};
