//! Attribute merging.
//!
//! Every taxonomy node carries a list of custom attribute values. Consumers
//! look attributes up either by attribute id or by attribute name, so each
//! value is stored under both keys.

use crate::models::{AttributeMap, AttributeValue};

/// Flatten one node's attribute values into a key/value mapping.
///
/// Each value lands under its attribute id and under its attribute name.
/// Later entries overwrite earlier ones with the same key.
pub fn merge_attributes(values: &[AttributeValue]) -> AttributeMap {
    let mut merged = AttributeMap::new();

    for av in values {
        if let Some(ref id) = av.attribute.id {
            merged.insert(id.clone(), av.value.clone());
        }
        if let Some(ref name) = av.attribute.name {
            merged.insert(name.clone(), av.value.clone());
        }
    }

    merged
}

/// Merge layers in increasing specificity order: later layers win.
pub fn merge_layers(layers: &[&AttributeMap]) -> AttributeMap {
    let mut merged = AttributeMap::new();
    for layer in layers {
        merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Identity fields for a node, under the given key names.
///
/// Both keys are always present so an inherited value under either key is
/// overwritten. A missing name is emitted as `""`.
pub fn identity(id_key: &str, id: &str, name_key: &str, name: Option<&str>) -> AttributeMap {
    AttributeMap::from([
        (id_key.to_string(), id.to_string()),
        (name_key.to_string(), name.unwrap_or_default().to_string()),
    ])
}
