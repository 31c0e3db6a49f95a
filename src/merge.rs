//! Attribute merging with an explicit precedence order.
//!
//! Merges are shallow: a key present in a higher-precedence layer replaces the
//! whole value from lower layers.
use crate::document::Attributes;

/// Merge `layers`, highest precedence first.
pub fn by_precedence(layers: &[&Attributes]) -> Attributes {
    let mut merged = Attributes::new();
    for layer in layers.iter().rev() {
        overlay(&mut merged, layer);
    }
    merged
}

/// Copy every key of `incoming` into `base`, replacing existing values.
pub fn overlay(base: &mut Attributes, incoming: &Attributes) {
    for (key, value) in incoming {
        base.insert(key.clone(), value.clone());
    }
}
