//! License references and the rights-reserved marker.
//!
//! Every artwork ends with a single license reference: its own declaration,
//! else the global one. Local paths become `file://` URIs, URLs are kept and
//! anything else is dropped with a warning. The global license field is
//! removed once it has been applied.
use crate::document::{ArtworkId, MetadataDocument};
use crate::error::{ConfigurationError, InputWarning, ResolveResult};
use crate::reference::Reference;
use crate::util::{absolute_from, canonical_or_lexical};
use crate::vocabulary::{self, fields};
use serde_json::Value;
use std::path::Path;

/// File-name prefix of public-domain dedications.
pub const PUBLIC_DOMAIN_PREFIX: &str = "CC0";

const GLOBAL_SCOPE: &str = "global";

/// Resolve license references for every artwork and set the rights marker.
pub fn resolve_licenses(doc: &mut MetadataDocument) -> ResolveResult<()> {
    let mut warnings = Vec::new();

    let global_value = doc
        .global
        .get(fields::LICENSE)
        .filter(|value| !vocabulary::is_empty(value))
        .cloned();
    let global_base = doc.global_origin(fields::LICENSE).map(Path::to_path_buf);
    let global = global_value.as_ref().and_then(|value| {
        let resolved = match &global_base {
            Some(base) => resolve_value(value, base),
            // Nothing to anchor a relative path to.
            None => Reference::from_value(value)
                .filter(|reference| matches!(reference, Reference::RemoteUrl(_) | Reference::LocalFile(_))),
        };
        if resolved.is_none() {
            warnings.push(invalid(GLOBAL_SCOPE, value));
        }
        resolved
    });

    let global_marker = doc.global.get(fields::MARKED).cloned();

    let mut resolved: Vec<(ArtworkId, Option<Reference>)> = Vec::new();
    for id in doc.artwork_ids() {
        let Some(entry) = doc.artworks.get(&id) else {
            continue;
        };
        let local_value = entry
            .attributes
            .get(fields::LICENSE)
            .filter(|value| !vocabulary::is_empty(value));
        let local = local_value.and_then(|value| {
            let reference = resolve_value(value, &entry.source_dir);
            if reference.is_none() {
                warnings.push(invalid(&id.uri(), value));
            }
            reference
        });
        if local.is_none() && local_value.is_none() && global_value.is_none() {
            return Err(ConfigurationError::MissingLicense { artwork: id.uri() }.into());
        }
        let reference = local.or_else(|| global.clone());
        tracing::debug!(
            artwork = %id,
            license = reference.as_ref().map(Reference::target).unwrap_or_default(),
            "license resolved"
        );
        resolved.push((id, reference));
    }

    for (id, reference) in resolved {
        let Some(entry) = doc.artworks.get_mut(&id) else {
            continue;
        };
        let attributes = &mut entry.attributes;
        match &reference {
            Some(reference) => {
                vocabulary::propagate(attributes, fields::LICENSE, &reference.to_value(), true)
            }
            None => vocabulary::remove_all(attributes, fields::LICENSE),
        }
        let explicit = attributes.get(fields::MARKED).or(global_marker.as_ref());
        if let Some(marked) = rights_marker(explicit, reference.as_ref()) {
            attributes.insert(fields::MARKED.to_string(), Value::Bool(marked));
        }
    }

    vocabulary::remove_all(&mut doc.global, fields::LICENSE);
    for member in vocabulary::synonyms_of(fields::LICENSE) {
        doc.global_origins.remove(*member);
    }
    for warning in warnings {
        doc.warn(warning);
    }
    Ok(())
}

/// Resolve one license value relative to `base`.
///
/// Returns `None` when the value is neither an existing file nor a URL.
pub fn resolve_value(value: &Value, base: &Path) -> Option<Reference> {
    match Reference::from_value(value)? {
        Reference::Scalar(text) => {
            let path = absolute_from(base, Path::new(&text));
            path.is_file()
                .then(|| Reference::LocalFile(canonical_or_lexical(&path)))
        }
        Reference::InlineTable(path, attributes) => {
            let path = absolute_from(base, &path);
            path.is_file()
                .then(|| Reference::InlineTable(canonical_or_lexical(&path), attributes))
        }
        reference @ (Reference::LocalFile(_) | Reference::RemoteUrl(_)) => Some(reference),
    }
}

/// The rights-reserved flag for an artwork.
///
/// An explicit value wins (`"false"` in any case reads as `false`). Otherwise
/// a license whose file name starts with `CC0` is public domain and anything
/// else reserves rights. Without a license no marker is set.
pub fn rights_marker(explicit: Option<&Value>, license: Option<&Reference>) -> Option<bool> {
    match explicit {
        Some(Value::Bool(flag)) => return Some(*flag),
        Some(Value::String(text)) if !text.trim().is_empty() => {
            return Some(!text.trim().eq_ignore_ascii_case("false"))
        }
        _ => {}
    }
    let license = license?;
    let public_domain = license.file_name().is_some_and(|name| {
        name.get(..PUBLIC_DOMAIN_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PUBLIC_DOMAIN_PREFIX))
    });
    Some(!public_domain)
}

fn invalid(scope: &str, value: &Value) -> InputWarning {
    InputWarning::InvalidLicense {
        scope: scope.to_string(),
        value: match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        },
    }
}
