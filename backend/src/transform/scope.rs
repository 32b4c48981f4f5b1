//! Dimension resolution.
//!
//! Turns the current navigation selection into the group-set and group ids
//! that are in scope, then into the query parameters expected by the
//! upstream analytics query builder.
//!
//! Resolution order (first match wins):
//!
//! 1. a selected element: exactly `{elementGroupSet}` and `{element}`
//! 2. a program: group-sets carrying the program as an attribute value, and their groups
//! 3. otherwise every group-set, with groups narrowed to `elementGroupSet` when set

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{NavigationContext, TaxonomyGroupSet};

/// Prefix of every entry in the `deg` query parameter.
pub const DEG_PREFIX: &str = "DE_GROUP-";

static DEG_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^DE_GROUP-([^;]+)$").expect("valid deg pattern")
});

/// Group-set and group ids in scope for the current view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScope {
    pub group_sets: Vec<String>,
    pub data_element_groups: Vec<String>,
}

/// Parameters handed to the upstream analytics query builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryParams {
    pub deg: String,
    pub pe: String,
    pub ou: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

/// Resolve which group-sets and groups are in scope.
pub fn resolve_scope(ctx: &NavigationContext, group_sets: &[TaxonomyGroupSet]) -> DimensionScope {
    // Direct selection overrides everything else
    if let Some(ref element) = ctx.element {
        return DimensionScope {
            group_sets: ctx.element_group_set.iter().cloned().collect(),
            data_element_groups: vec![element.clone()],
        };
    }

    if let Some(ref program) = ctx.program {
        let matching: Vec<&TaxonomyGroupSet> = group_sets
            .iter()
            .filter(|gs| gs.belongs_to_program(program))
            .collect();

        return DimensionScope {
            group_sets: matching.iter().map(|gs| gs.id.clone()).collect(),
            data_element_groups: matching
                .iter()
                .flat_map(|gs| gs.groups.iter().map(|g| g.id.clone()))
                .collect(),
        };
    }

    let data_element_groups = match ctx.element_group_set {
        Some(ref selected) => group_sets
            .iter()
            .filter(|gs| &gs.id == selected)
            .flat_map(|gs| gs.groups.iter().map(|g| g.id.clone()))
            .collect(),
        None => group_sets
            .iter()
            .flat_map(|gs| gs.groups.iter().map(|g| g.id.clone()))
            .collect(),
    };

    DimensionScope {
        group_sets: group_sets.iter().map(|gs| gs.id.clone()).collect(),
        data_element_groups,
    }
}

/// Build the upstream query parameters from a resolved scope.
pub fn build_query_params(scope: &DimensionScope, ctx: &NavigationContext) -> QueryParams {
    let deg = scope
        .data_element_groups
        .iter()
        .map(|id| format!("{}{}", DEG_PREFIX, id))
        .collect::<Vec<_>>()
        .join(";");

    QueryParams {
        deg,
        pe: ctx.periods.clone().unwrap_or_default(),
        ou: ctx.org_unit.clone().unwrap_or_default(),
        program: ctx.program.clone(),
    }
}

/// Recover group ids from a `deg` parameter. Malformed entries are ignored.
pub fn parse_deg(deg: &str) -> Vec<String> {
    deg.split(';')
        .map(str::trim)
        .filter_map(|entry| DEG_ENTRY.captures(entry))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
