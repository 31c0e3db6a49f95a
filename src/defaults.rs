//! Document-level defaults applied after references are resolved.
use crate::document::{Attributes, MetadataDocument};
use crate::vocabulary::{self, fields};
use serde_json::Value;

pub const SCHEMA_CONTEXT: &str = "https://schema.org/";
pub const DEFAULT_TYPE: &str = "CreativeWork";
pub const DEFAULT_VERSION: i64 = 1;

/// Fill document defaults and drop fields left empty.
///
/// The copyright holder defaults to the creator: per artwork when the artwork
/// names a creator and no owner is declared at either level, then globally.
/// Explicit `null` values are kept.
pub fn apply_defaults(doc: &mut MetadataDocument) {
    let global_owner = has_value(&doc.global, fields::COPYRIGHT_HOLDER);
    for id in doc.artwork_ids() {
        let Some(entry) = doc.artworks.get_mut(&id) else {
            continue;
        };
        prune_empty(&mut entry.attributes);
        if !global_owner {
            default_owner(&mut entry.attributes);
        }
    }

    let global = &mut doc.global;
    prune_empty(global);
    vocabulary::propagate(
        global,
        fields::CONTEXT,
        &Value::String(SCHEMA_CONTEXT.to_string()),
        true,
    );
    if !has_value(global, fields::TYPE) {
        vocabulary::propagate(global, fields::TYPE, &Value::String(DEFAULT_TYPE.to_string()), false);
    }
    if !has_value(global, fields::VERSION) {
        vocabulary::propagate(global, fields::VERSION, &Value::from(DEFAULT_VERSION), false);
    }
    default_owner(global);
}

fn default_owner(attributes: &mut Attributes) {
    if has_value(attributes, fields::COPYRIGHT_HOLDER) {
        return;
    }
    let creator = attributes
        .get("schema:creator")
        .or_else(|| attributes.get(fields::CREATOR))
        .filter(|value| !vocabulary::is_empty(value))
        .cloned();
    if let Some(creator) = creator {
        vocabulary::propagate(attributes, "schema:copyrightHolder", &creator, false);
    }
}

fn has_value(attributes: &Attributes, field: &str) -> bool {
    let present = |member: &str| {
        attributes
            .get(member)
            .is_some_and(|value| !vocabulary::is_empty(value))
    };
    present(field) || vocabulary::synonyms_of(field).iter().copied().any(present)
}

fn prune_empty(attributes: &mut Attributes) {
    attributes.retain(|_, value| value.is_null() || !vocabulary::is_empty(value));
}
