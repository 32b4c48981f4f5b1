//! Domain models for the scorecard reshaping engine.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`TaxonomyGroupSet`] / [`TaxonomyGroup`] / [`TaxonomyElement`] - The three-level taxonomy
//! - [`AttributeValue`] - A custom attribute value attached to any taxonomy node
//! - [`NavigationContext`] - What the user currently has selected
//! - [`SparseCell`] - One observed fact from the analytics table
//! - [`Direction`] - Whether higher or lower ratios are better
//! - [`PerformanceBand`] / [`Style`] - Classification of a ratio
//!
//! Wire names follow the upstream metadata API (camelCase).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat key/value mapping produced by attribute merging.
pub type AttributeMap = BTreeMap<String, String>;

/// One fully merged element, keyed by field name.
pub type EnrichedElementRecord = AttributeMap;

// =============================================================================
// Taxonomy
// =============================================================================

/// Reference to the attribute definition a value belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AttributeRef {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
}

/// A custom attribute value on a taxonomy node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AttributeValue {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub attribute: AttributeRef,
}

impl AttributeValue {
    /// Build a value for attribute `id` named `name`.
    pub fn new(id: &str, name: &str, value: &str) -> Self {
        Self {
            value: value.to_string(),
            attribute: AttributeRef {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
            },
        }
    }
}

/// Leaf of the taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyElement {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub attribute_values: Vec<AttributeValue>,
}

/// Middle level: a group of elements, possibly carrying nested group-sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyGroup {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub attribute_values: Vec<AttributeValue>,
    /// Subordinate group-sets, flattened recursively under this group.
    #[serde(default, alias = "dataElementGroupSets", deserialize_with = "lenient_list")]
    pub group_sets: Vec<TaxonomyGroupSet>,
    #[serde(default, rename = "dataElements", deserialize_with = "lenient_list")]
    pub elements: Vec<TaxonomyElement>,
}

/// Top level of the taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyGroupSet {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub attribute_values: Vec<AttributeValue>,
    #[serde(default, rename = "dataElementGroups", deserialize_with = "lenient_list")]
    pub groups: Vec<TaxonomyGroup>,
}

impl TaxonomyGroupSet {
    /// Whether any attribute value on this group-set equals `program`.
    pub fn belongs_to_program(&self, program: &str) -> bool {
        self.attribute_values.iter().any(|av| av.value == program)
    }
}

// =============================================================================
// Lenient field readers
// =============================================================================

// Metadata exports are not always clean: a malformed nested field degrades
// to empty instead of failing the whole taxonomy.

/// A list field; `null`, a non-array or unreadable items yield nothing.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A string field; numbers and booleans are stringified, anything else is `""`.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?))
}

// =============================================================================
// Navigation
// =============================================================================

/// Current selection, as plain query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationContext {
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub element_group: Option<String>,
    #[serde(default)]
    pub element_group_set: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    /// `;`-separated period ids.
    #[serde(default)]
    pub periods: Option<String>,
    #[serde(default)]
    pub org_unit: Option<String>,
}

impl NavigationContext {
    /// Period ids, in the order given.
    pub fn period_list(&self) -> Vec<String> {
        self.periods
            .as_deref()
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    }
}

// =============================================================================
// Sparse input
// =============================================================================

/// One observed fact from an analytics row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SparseCell {
    pub entity: String,
    pub dimension: String,
    pub period: String,
    pub value: String,
}

impl SparseCell {
    /// Read `[entity, _, dimension, period, value]`. Short rows yield `None`.
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Option<Self> {
        if row.len() < 5 {
            return None;
        }
        Some(Self {
            entity: row[0].as_ref().to_string(),
            dimension: row[2].as_ref().to_string(),
            period: row[3].as_ref().to_string(),
            value: row[4].as_ref().to_string(),
        })
    }
}

// =============================================================================
// Performance
// =============================================================================

/// Which side of the ratio counts as good performance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Higher is better.
    #[default]
    Ascending,
    /// Lower is better.
    Descending,
}

impl Direction {
    /// Convert a boolean `descending` flag.
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    /// Parse a string flag as delivered by attribute values (`"true"` = descending).
    pub fn from_flag(flag: &str) -> Self {
        Self::from_descending(flag.trim().eq_ignore_ascii_case("true"))
    }

    pub fn is_descending(self) -> bool {
        self == Self::Descending
    }
}

/// Background/text color pair used to render a band.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub background_color: &'static str,
    pub color: &'static str,
}

/// Classification of a performance ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceBand {
    Achieved,
    Moderate,
    NotAchieved,
    NoData,
}

impl PerformanceBand {
    /// All bands, best first.
    pub const ALL: [PerformanceBand; 4] = [
        Self::Achieved,
        Self::Moderate,
        Self::NotAchieved,
        Self::NoData,
    ];

    /// Wire label, e.g. `"not-achieved"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Achieved => "achieved",
            Self::Moderate => "moderate",
            Self::NotAchieved => "not-achieved",
            Self::NoData => "no-data",
        }
    }

    /// Color name (green / yellow / red / gray).
    pub fn color_name(self) -> &'static str {
        match self {
            Self::Achieved => "green",
            Self::Moderate => "yellow",
            Self::NotAchieved => "red",
            Self::NoData => "gray",
        }
    }

    /// Background is the band's color; text is white on green and red.
    pub fn style(self) -> Style {
        let color = match self {
            Self::Achieved | Self::NotAchieved => "white",
            Self::Moderate | Self::NoData => "black",
        };
        Style {
            background_color: self.color_name(),
            color,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
