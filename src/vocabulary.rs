//! Synonym table across the metadata namespaces.
//!
//! Field names come from four overlapping vocabularies: XMP Dublin Core
//! (`XMP-dc:`) and XMP rights (`XMP-xmpRights:`), EXIF (`Exif:`), schema.org
//! (`schema:`) and the marketplace token format (`nft:`). Each group lists the
//! names that denote the same fact, ordered by namespace priority; the first
//! member is the preferred name.
use crate::document::Attributes;
use serde_json::{json, Value};

/// Prefix of the JSON-LD namespace, preferred for structured values.
pub const JSON_LD_PREFIX: &str = "schema:";

/// How values are shaped across the members of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    /// Every member carries the same value.
    Plain,
    /// People or organizations: `schema:` members hold a list of structured
    /// entries, the other members a comma-joined display string.
    Agent,
    /// Type names: `schema:` members hold the name (or list of names), the
    /// other members a comma-joined display string.
    Type,
}

/// One semantic fact and the field names denoting it.
#[derive(Debug)]
pub struct SynonymGroup {
    pub members: &'static [&'static str],
    pub kind: GroupKind,
}

impl SynonymGroup {
    const fn plain(members: &'static [&'static str]) -> Self {
        Self {
            members,
            kind: GroupKind::Plain,
        }
    }

    const fn agent(members: &'static [&'static str]) -> Self {
        Self {
            members,
            kind: GroupKind::Agent,
        }
    }

    /// The group's preferred field name.
    pub fn preferred(&self) -> &'static str {
        self.members[0]
    }

    fn member(&self, field: &str) -> Option<&'static str> {
        self.members
            .iter()
            .copied()
            .find(|member| member.eq_ignore_ascii_case(field))
    }

    fn member_by_local_name(&self, field: &str) -> Option<&'static str> {
        self.members.iter().copied().find(|member| {
            member
                .split_once(':')
                .is_some_and(|(_, local)| local.eq_ignore_ascii_case(field))
        })
    }
}

// Order matters: XMP-dc, XMP-xmpRights, Exif, nft, schema.
static GROUPS: &[SynonymGroup] = &[
    SynonymGroup::agent(&["XMP-dc:Contributor", "schema:contributor"]),
    SynonymGroup::plain(&["XMP-dc:Coverage"]),
    SynonymGroup::agent(&["XMP-dc:Creator", "Exif:Artist", "schema:creator"]),
    SynonymGroup::plain(&["XMP-dc:Date", "schema:datePublished"]),
    SynonymGroup::plain(&["XMP-dc:Description", "nft:description", "schema:description"]),
    SynonymGroup::plain(&["XMP-dc:Format"]),
    SynonymGroup::plain(&["XMP-dc:Identifier", "schema:@id"]),
    SynonymGroup::plain(&["XMP-dc:Language"]),
    SynonymGroup::agent(&["XMP-dc:Publisher", "schema:publisher"]),
    SynonymGroup::plain(&["XMP-dc:Relation"]),
    SynonymGroup::plain(&["XMP-dc:Rights"]),
    SynonymGroup::plain(&["XMP-dc:Source"]),
    SynonymGroup::plain(&["XMP-dc:Subject"]),
    SynonymGroup::plain(&["XMP-dc:Title", "nft:name", "schema:name", "Exif:ImageDescription"]),
    SynonymGroup {
        members: &["XMP-dc:Type", "schema:@type"],
        kind: GroupKind::Type,
    },
    SynonymGroup::plain(&["XMP-xmpRights:Certificate"]),
    SynonymGroup::plain(&["XMP-xmpRights:Marked"]),
    SynonymGroup::agent(&["XMP-xmpRights:Owner", "schema:copyrightHolder"]),
    SynonymGroup::plain(&["XMP-xmpRights:UsageTerms", "schema:usageInfo"]),
    SynonymGroup::plain(&["XMP-xmpRights:WebStatement", "schema:license"]),
    SynonymGroup::plain(&["Exif:Copyright"]),
    SynonymGroup::plain(&["Exif:DateTimeDigitized", "Exif:CreateDate", "schema:dateCreated"]),
    SynonymGroup::plain(&["Exif:DateTimeOriginal"]),
    SynonymGroup::plain(&["Exif:DateTime", "Exif:ModifyDate", "schema:dateModified"]),
    SynonymGroup::plain(&["nft:image", "schema:image", "nft:image_url"]),
    SynonymGroup::plain(&["nft:image_details"]),
    SynonymGroup::plain(&["nft:external_url", "schema:url"]),
    SynonymGroup::plain(&["nft:attributes"]),
    SynonymGroup::plain(&["nft:properties"]),
    SynonymGroup::plain(&["schema:additionalProperty"]),
    SynonymGroup::plain(&["schema:associatedMedia"]),
    SynonymGroup::plain(&["schema:@context"]),
    SynonymGroup::plain(&["schema:copyrightYear"]),
    SynonymGroup::plain(&["schema:encodingFormat"]),
    SynonymGroup::plain(&["schema:sameAs"]),
    SynonymGroup::plain(&["schema:version"]),
];

/// Well-known field names used by the resolvers.
pub mod fields {
    pub const CERTIFICATE: &str = "XMP-xmpRights:Certificate";
    pub const CONTEXT: &str = "schema:@context";
    pub const COPYRIGHT_HOLDER: &str = "XMP-xmpRights:Owner";
    pub const CREATOR: &str = "XMP-dc:Creator";
    pub const IDENTIFIER: &str = "XMP-dc:Identifier";
    pub const LICENSE: &str = "XMP-xmpRights:WebStatement";
    pub const MARKED: &str = "XMP-xmpRights:Marked";
    pub const TYPE: &str = "XMP-dc:Type";
    pub const VERSION: &str = "schema:version";
}

/// All synonym groups in priority order.
pub fn groups() -> &'static [SynonymGroup] {
    GROUPS
}

/// Find the group a field belongs to.
///
/// Matching is case-insensitive; a fully namespaced name wins over a bare
/// local name, so `creator` and `XMP-DC:CREATOR` land in the same group.
pub fn group_of(field: &str) -> Option<&'static SynonymGroup> {
    let field = field.trim();
    GROUPS
        .iter()
        .find(|group| group.member(field).is_some())
        .or_else(|| {
            GROUPS
                .iter()
                .find(|group| group.member_by_local_name(field).is_some())
        })
}

/// Resolve a field to the table's own spelling of the matched member.
pub fn lookup(field: &str) -> Option<&'static str> {
    let field = field.trim();
    GROUPS
        .iter()
        .find_map(|group| group.member(field))
        .or_else(|| {
            GROUPS
                .iter()
                .find_map(|group| group.member_by_local_name(field))
        })
}

/// The preferred name of the field's group.
pub fn canonical_name(field: &str) -> Option<&'static str> {
    group_of(field).map(SynonymGroup::preferred)
}

/// The best name under which `value` should be stored for `field`.
///
/// Structured values prefer the JSON-LD member of the group; everything else
/// takes the group's preferred name.
pub fn canonical_name_for(field: &str, value: &Value) -> Option<&'static str> {
    let group = group_of(field)?;
    if is_structured(value) {
        if let Some(member) = group
            .members
            .iter()
            .copied()
            .find(|member| member.starts_with(JSON_LD_PREFIX))
        {
            return Some(member);
        }
    }
    Some(group.preferred())
}

/// All names in the group of `field`, or an empty slice for unknown fields.
pub fn synonyms_of(field: &str) -> &'static [&'static str] {
    group_of(field).map(|group| group.members).unwrap_or(&[])
}

/// Write `value` into every synonym of `field`.
///
/// With `overwrite` off only unset synonyms are filled, but the member named
/// by `field` itself is always written. An empty value removes instead: every
/// synonym with `overwrite`, only `field` itself without it. Unknown fields
/// are written (or removed) as-is.
pub fn propagate(attributes: &mut Attributes, field: &str, value: &Value, overwrite: bool) {
    let Some(group) = group_of(field) else {
        if is_empty(value) {
            attributes.remove(field);
        } else {
            attributes.insert(field.to_string(), value.clone());
        }
        return;
    };
    let own = lookup(field).unwrap_or_else(|| group.preferred());

    if is_empty(value) {
        if overwrite {
            for member in group.members {
                attributes.remove(*member);
            }
        } else {
            attributes.remove(own);
        }
        return;
    }

    for member in group.members.iter().copied() {
        let unset = !attributes
            .get(member)
            .is_some_and(|existing| !is_empty(existing));
        if member == own || overwrite || unset {
            attributes.insert(member.to_string(), shape_for(group, member, value));
        }
    }
}

/// Remove `field` and all of its synonyms.
pub fn remove_all(attributes: &mut Attributes, field: &str) {
    match group_of(field) {
        Some(group) => {
            for member in group.members {
                attributes.remove(*member);
            }
        }
        None => {
            attributes.remove(field);
        }
    }
}

/// Whether a value counts as unset: null, blank string, empty list or table.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn is_structured(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().any(Value::is_object),
        _ => false,
    }
}

fn shape_for(group: &SynonymGroup, member: &str, value: &Value) -> Value {
    let structured_member = member.starts_with(JSON_LD_PREFIX);
    match group.kind {
        GroupKind::Plain => value.clone(),
        GroupKind::Agent if structured_member => agents(value),
        GroupKind::Type if structured_member => type_names(value),
        GroupKind::Agent | GroupKind::Type => Value::String(display_names(value).join(", ")),
    }
}

/// Names carried by an agent or type value.
///
/// A string is split on commas; lists may mix strings and `{ name = ... }`
/// tables.
pub fn display_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items.iter().flat_map(display_names).collect(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(|name| vec![name.trim().to_string()])
            .unwrap_or_default(),
        Value::Bool(_) | Value::Number(_) => vec![value.to_string()],
        Value::Null => Vec::new(),
    }
}

fn agents(value: &Value) -> Value {
    match value {
        // Already structured by the author.
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            value.clone()
        }
        Value::Object(_) => Value::Array(vec![value.clone()]),
        _ => Value::Array(
            display_names(value)
                .into_iter()
                .map(|name| json!({ "@type": "Person", "name": name }))
                .collect(),
        ),
    }
}

fn type_names(value: &Value) -> Value {
    let mut names = display_names(value);
    if names.len() == 1 {
        Value::String(names.remove(0))
    } else {
        Value::Array(names.into_iter().map(Value::String).collect())
    }
}

#[cfg(test)]
#[path = "vocabulary_tests.rs"]
mod tests;
