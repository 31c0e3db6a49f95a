//! Canonical field names and cross-namespace propagation.
//!
//! Runs over the global attributes first, then every artwork. Normalizing an
//! already normalized document changes nothing.
use crate::document::{ArtworkId, Attributes, MetadataDocument};
use crate::error::{ConfigurationError, ResolveResult};
use crate::vocabulary::{self, fields};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Normalize every attribute map of the document in place.
pub fn normalize(doc: &mut MetadataDocument) -> ResolveResult<()> {
    let renames = normalize_attributes(&mut doc.global);
    carry_origins(&mut doc.global_origins, &renames);
    spread_origins(&mut doc.global_origins);
    for (id, entry) in doc.artworks.iter_mut() {
        normalize_attributes(&mut entry.attributes);
        normalize_artwork_identifier(id, &mut entry.attributes)?;
    }
    tracing::debug!(
        global = doc.global.len(),
        artworks = doc.artworks.len(),
        "normalized field names"
    );
    Ok(())
}

/// Rename known fields to their canonical names and fill their synonyms.
///
/// Keys already spelled as a vocabulary member keep their name. String values
/// are trimmed. Empty values are renamed but not propagated. An alias whose
/// canonical name already holds a value is dropped.
/// Returns the `(from, to)` renames performed.
pub fn normalize_attributes(attributes: &mut Attributes) -> Vec<(String, String)> {
    let mut renames = Vec::new();
    let keys: Vec<String> = attributes.keys().cloned().collect();
    for key in keys {
        let Some(value) = attributes.get(&key).map(trimmed) else {
            continue;
        };
        let target = if vocabulary::lookup(&key) == Some(key.as_str()) {
            key.clone()
        } else {
            match vocabulary::canonical_name_for(&key, &value) {
                Some(name) => name.to_string(),
                None => {
                    attributes.insert(key, value);
                    continue;
                }
            }
        };

        if target != key {
            attributes.remove(&key);
            let occupied = attributes
                .get(&target)
                .is_some_and(|existing| !vocabulary::is_empty(existing));
            if occupied {
                tracing::debug!(alias = %key, field = %target, "alias shadowed by canonical field");
                continue;
            }
            renames.push((key, target.clone()));
        }
        if vocabulary::is_empty(&value) {
            // Kept: an empty value can be an explicit opt-out.
            attributes.insert(target, value);
            continue;
        }
        vocabulary::propagate(attributes, &target, &value, false);
    }
    renames
}

fn carry_origins(origins: &mut BTreeMap<String, PathBuf>, renames: &[(String, String)]) {
    for (from, to) in renames {
        if let Some(origin) = origins.remove(from) {
            origins.insert(to.clone(), origin);
        }
    }
}

/// Give every synonym of a declared key the declaring source's directory.
fn spread_origins(origins: &mut BTreeMap<String, PathBuf>) {
    let declared: Vec<(String, PathBuf)> = origins
        .iter()
        .map(|(key, origin)| (key.clone(), origin.clone()))
        .collect();
    for (key, origin) in declared {
        for member in vocabulary::synonyms_of(&key) {
            origins
                .entry((*member).to_string())
                .or_insert_with(|| origin.clone());
        }
    }
}

fn trimmed(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(text.trim().to_string()),
        other => other.clone(),
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^urn:[a-z0-9]+:[^:\s]+:[0-9]+$").expect("identifier regex")
    })
}

/// Normalize `urn:<chain>:<collection>:<token>`.
///
/// The `urn` prefix and chain name are lower-cased; the collection address
/// keeps its case. Returns `None` when the result is not well formed.
pub fn normalize_identifier(identifier: &str) -> Option<String> {
    let parts: Vec<&str> = identifier.trim().split(':').map(str::trim).collect();
    let [scheme, chain, collection, token] = parts.as_slice() else {
        return None;
    };
    let normalized = format!(
        "{}:{}:{}:{}",
        scheme.to_lowercase(),
        chain.to_lowercase(),
        collection,
        token
    );
    identifier_pattern()
        .is_match(&normalized)
        .then_some(normalized)
}

fn normalize_artwork_identifier(id: &ArtworkId, attributes: &mut Attributes) -> ResolveResult<()> {
    let Some(value) = attributes.get(fields::IDENTIFIER).cloned() else {
        return Ok(());
    };
    let normalized = value.as_str().and_then(normalize_identifier);
    let Some(normalized) = normalized else {
        return Err(ConfigurationError::InvalidIdentifier {
            artwork: id.uri(),
            identifier: match value {
                Value::String(text) => text,
                other => other.to_string(),
            },
        }
        .into());
    };
    vocabulary::propagate(attributes, fields::IDENTIFIER, &Value::String(normalized), true);
    Ok(())
}
