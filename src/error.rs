//! Error taxonomy for metadata resolution.
//!
//! Fatal problems surface as [`ResolveError`] and abort the document build.
//! Recoverable input problems are [`InputWarning`] values: they are logged and
//! recorded on the document, and the affected field degrades to absent.
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems detected while resolving a document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A standalone certificate table has no `<artwork>/` directory context.
    #[error("certificate context not provided in {header:?}; expected <artwork>/<certificate>.pdf")]
    CertificateContext { header: String },

    /// A standalone certificate table was not absorbed by any artwork.
    #[error("certificate table {header:?} does not match any artwork")]
    UnmatchedCertificateTable { header: String },

    /// An artwork ended without a license and none was declared anywhere.
    #[error("no license declared for {artwork} and no global license to fall back to")]
    MissingLicense { artwork: String },

    /// The artwork identifier is not `urn:<chain>:<collection>:<token>`.
    #[error("invalid identifier {identifier:?} for {artwork}: expected urn:<chain>:<collection>:<token>")]
    InvalidIdentifier { artwork: String, identifier: String },

    /// No metadata source was given.
    #[error("no metadata sources given")]
    NoSources,
}

/// Errors returned by the resolution pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        ResolveError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Recoverable input problems; resolution continues without the offending value.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputWarning {
    #[error("{header:?} in {} matched no artwork files", source_path.display())]
    UnmatchedHeader {
        source_path: PathBuf,
        header: String,
    },

    #[error("license {value:?} for {scope} is neither a file nor a URL; ignoring it")]
    InvalidLicense { scope: String, value: String },

    #[error("certificate {value:?} for {artwork} is not a local .pdf file; ignoring it")]
    IgnoredCertificate { artwork: String, value: String },

    #[error("global certificate {value:?} is not a .pdf path; falling back to {fallback}")]
    UnsupportedGlobalCertificate { value: String, fallback: String },
}
