//! Flatten the taxonomy into one enriched record per element.
//!
//! # Architecture
//!
//! ```text
//! Taxonomy (nested)                       →  Enriched records (flat)
//! ┌──────────────────────────────┐          ┌──────────────────────────────┐
//! │ GroupSet G1 {unit: count}    │          │ E1: id, name, degsId: G1,    │
//! │   Group Grp1 {color: blue}   │    →     │     degId: Grp1, unit: count,│
//! │     Element E1 {color: red}  │          │     color: red               │
//! └──────────────────────────────┘          └──────────────────────────────┘
//! ```
//!
//! Layers are applied in increasing specificity: group-set, group, element,
//! then the element's own identity. The group-set and group identities are
//! kept under the marker keys [`GROUP_SET_ID`] / [`GROUP_ID`] (and their
//! name counterparts) so a record always says where it rolled up from.
//!
//! An element listed under several groups or group-sets collapses into one
//! record: occurrences are merged in encounter order, later ones winning.

use std::collections::BTreeMap;

use super::attributes::{identity, merge_attributes, merge_layers};
use crate::models::{
    AttributeMap, EnrichedElementRecord, TaxonomyGroup, TaxonomyGroupSet,
};

/// Marker key for the id of the group-set an element rolled up from.
pub const GROUP_SET_ID: &str = "degsId";
/// Marker key for the name of that group-set.
pub const GROUP_SET_NAME: &str = "degsName";
/// Marker key for the id of the group an element rolled up from.
pub const GROUP_ID: &str = "degId";
/// Marker key for the name of that group.
pub const GROUP_NAME: &str = "degName";

/// Enriched records keyed by element id.
pub type EnrichedRecords = BTreeMap<String, EnrichedElementRecord>;

/// Flatten group-sets into enriched element records keyed by element id.
pub fn flatten_hierarchy(group_sets: &[TaxonomyGroupSet]) -> EnrichedRecords {
    let mut records = EnrichedRecords::new();
    let root = AttributeMap::new();

    for group_set in group_sets {
        flatten_group_set(group_set, &root, &mut records);
    }

    records
}

/// The group-set's own layer: attributes plus its marker fields.
pub fn group_set_layer(group_set: &TaxonomyGroupSet) -> AttributeMap {
    let own = merge_attributes(&group_set.attribute_values);
    let markers = identity(
        GROUP_SET_ID,
        &group_set.id,
        GROUP_SET_NAME,
        group_set.name.as_deref(),
    );
    merge_layers(&[&own, &markers])
}

/// The group's own layer: attributes plus its marker fields.
pub fn group_layer(group: &TaxonomyGroup) -> AttributeMap {
    let own = merge_attributes(&group.attribute_values);
    let markers = identity(GROUP_ID, &group.id, GROUP_NAME, group.name.as_deref());
    merge_layers(&[&own, &markers])
}

fn flatten_group_set(
    group_set: &TaxonomyGroupSet,
    base: &AttributeMap,
    records: &mut EnrichedRecords,
) {
    let combined = merge_layers(&[base, &group_set_layer(group_set)]);

    for group in &group_set.groups {
        flatten_group(group, &combined, records);
    }
}

fn flatten_group(group: &TaxonomyGroup, group_set_combined: &AttributeMap, records: &mut EnrichedRecords) {
    let combined = merge_layers(&[group_set_combined, &group_layer(group)]);

    for element in &group.elements {
        if element.id.is_empty() {
            continue;
        }

        let own = merge_attributes(&element.attribute_values);
        let id = identity("id", &element.id, "name", element.name.as_deref());
        let record = merge_layers(&[&combined, &own, &id]);

        // Fan-out: fold every occurrence into the same record
        records
            .entry(element.id.clone())
            .or_default()
            .extend(record);
    }

    for nested in &group.group_sets {
        flatten_group_set(nested, &combined, records);
    }
}
