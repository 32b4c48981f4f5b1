//! Sparse-to-dense pivot.
//!
//! Analytics rows only exist for the (entity, dimension, period) combinations
//! that were actually recorded. The pivot produces one dense row per
//! in-scope entity with a cell for every (period, dimension) pair, and
//! derived performance fields per period when both the target and actual
//! dimensions are requested.
//!
//! ```text
//! Sparse rows                              Dense row (E1)
//! ┌────────────────────────────────┐      ┌───────────────────────────────────┐
//! │ E1 _ target 2024Q1 50          │      │ 2024Q1.target            "50"     │
//! │ E1 _ actual 2024Q1 40          │  →   │ 2024Q1.actual            "40"     │
//! └────────────────────────────────┘      │ 2024Q1performance        "80%"    │
//!                                         │ 2024Q1performance-group  moderate │
//!                                         │ 2024Q1target / actual    1 / 1    │
//!                                         └───────────────────────────────────┘
//! ```
//!
//! The sparse rows are indexed once up front; every cell lookup is then a
//! hash lookup instead of a scan.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::flatten::EnrichedRecords;
use super::performance::{classify, format_percentage, parse_value, Thresholds};
use crate::models::{Direction, SparseCell};

/// One dense output row.
pub type DenseRow = Map<String, Value>;

/// Value stored for a missing cell.
pub const EMPTY_CELL: &str = "";

/// Pivot configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PivotOptions {
    /// Dimension id holding target values.
    pub target_dimension: String,
    /// Dimension id holding actual values.
    pub actual_dimension: String,
    /// Attribute on the enriched record flagging lower-is-better elements.
    pub direction_attribute: String,
    /// Direction for elements without the attribute.
    pub default_direction: Direction,
    pub thresholds: Thresholds,
}

impl Default for PivotOptions {
    fn default() -> Self {
        Self {
            target_dimension: "target".to_string(),
            actual_dimension: "actual".to_string(),
            direction_attribute: "isDescending".to_string(),
            default_direction: Direction::Ascending,
            thresholds: Thresholds::default(),
        }
    }
}

/// Key of the raw cell for `period` and `dimension`.
pub fn cell_key(period: &str, dimension: &str) -> String {
    format!("{}.{}", period, dimension)
}

pub fn performance_key(period: &str) -> String {
    format!("{}performance", period)
}

pub fn performance_group_key(period: &str) -> String {
    format!("{}performance-group", period)
}

pub fn style_key(period: &str) -> String {
    format!("{}style", period)
}

pub fn target_flag_key(period: &str) -> String {
    format!("{}target", period)
}

pub fn actual_flag_key(period: &str) -> String {
    format!("{}actual", period)
}

/// Read analytics rows into cells.
///
/// Returns the cells and the number of rows skipped for having fewer than
/// five columns.
pub fn cells_from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> (Vec<SparseCell>, usize) {
    let mut skipped = 0;
    let cells: Vec<SparseCell> = rows
        .iter()
        .filter_map(|row| {
            let cell = SparseCell::from_row(row);
            if cell.is_none() {
                skipped += 1;
            }
            cell
        })
        .collect();
    (cells, skipped)
}

/// Composite-key index over sparse cells, borrowing from them.
#[derive(Debug, Default)]
pub struct SparseIndex<'a> {
    cells: HashMap<(&'a str, &'a str, &'a str), &'a str>,
}

impl<'a> SparseIndex<'a> {
    /// Index cells by (entity, period, dimension). The first occurrence of a key wins.
    pub fn build(cells: &'a [SparseCell]) -> Self {
        let mut index = HashMap::with_capacity(cells.len());
        for cell in cells {
            index
                .entry((cell.entity.as_str(), cell.period.as_str(), cell.dimension.as_str()))
                .or_insert(cell.value.as_str());
        }
        Self { cells: index }
    }

    pub fn get(&self, entity: &str, period: &str, dimension: &str) -> Option<&str> {
        self.cells.get(&(entity, period, dimension)).copied()
    }
}

/// Build one dense row per entity.
///
/// Rows come back in the order of `entities` and carry the entity's
/// enriched metadata (when known) alongside the pivoted cells.
pub fn build_dense_rows(
    entities: &[String],
    periods: &[String],
    dimensions: &[String],
    cells: &[SparseCell],
    metadata: &EnrichedRecords,
    options: &PivotOptions,
) -> Vec<DenseRow> {
    let index = SparseIndex::build(cells);
    entities
        .iter()
        .map(|entity| build_dense_row(entity, periods, dimensions, &index, metadata, options))
        .collect()
}

/// Build the dense row for a single entity against a prebuilt index.
pub fn build_dense_row(
    entity: &str,
    periods: &[String],
    dimensions: &[String],
    index: &SparseIndex<'_>,
    metadata: &EnrichedRecords,
    options: &PivotOptions,
) -> DenseRow {
    let mut row = DenseRow::new();

    let record = metadata.get(entity);
    if let Some(record) = record {
        for (k, v) in record {
            row.insert(k.clone(), json!(v));
        }
    }
    row.insert("id".to_string(), json!(entity));

    let direction = record
        .and_then(|r| r.get(&options.direction_attribute))
        .map(|flag| Direction::from_flag(flag))
        .unwrap_or(options.default_direction);

    let scored = dimensions.contains(&options.target_dimension)
        && dimensions.contains(&options.actual_dimension);

    for period in periods {
        for dimension in dimensions {
            let value = index.get(entity, period, dimension).unwrap_or(EMPTY_CELL);
            row.insert(cell_key(period, dimension), json!(value));
        }

        if scored {
            let target = index
                .get(entity, period, &options.target_dimension)
                .unwrap_or(EMPTY_CELL);
            let actual = index
                .get(entity, period, &options.actual_dimension)
                .unwrap_or(EMPTY_CELL);
            insert_performance(&mut row, period, actual, target, direction, &options.thresholds);
        }
    }

    row
}

fn insert_performance(
    row: &mut DenseRow,
    period: &str,
    actual: &str,
    target: &str,
    direction: Direction,
    thresholds: &Thresholds,
) {
    let result = classify(parse_value(actual), parse_value(target), direction, thresholds);

    row.insert(performance_key(period), json!(format_percentage(result.ratio)));
    row.insert(performance_group_key(period), json!(result.band.label()));
    row.insert(style_key(period), json!(result.style));
    row.insert(target_flag_key(period), json!(presence(target)));
    row.insert(actual_flag_key(period), json!(presence(actual)));
}

fn presence(value: &str) -> u8 {
    if value.trim().is_empty() {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnrichedElementRecord;

    fn rows(raw: &[[&str; 5]]) -> Vec<SparseCell> {
        raw.iter().filter_map(|r| SparseCell::from_row(r)).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn dims() -> Vec<String> {
        strings(&["target", "actual"])
    }

    #[test]
    fn test_moderate_scenario() {
        let cells = rows(&[
            ["E1", "_", "target", "2024Q1", "50"],
            ["E1", "_", "actual", "2024Q1", "40"],
        ]);

        let out = build_dense_rows(
            &strings(&["E1"]),
            &strings(&["2024Q1"]),
            &dims(),
            &cells,
            &EnrichedRecords::new(),
            &PivotOptions::default(),
        );

        let row = &out[0];
        assert_eq!(row["id"], "E1");
        assert_eq!(row["2024Q1.target"], "50");
        assert_eq!(row["2024Q1.actual"], "40");
        assert_eq!(row["2024Q1performance"], "80%");
        assert_eq!(row["2024Q1performance-group"], "moderate");
        assert_eq!(row["2024Q1style"]["backgroundColor"], "yellow");
        assert_eq!(row["2024Q1target"], 1);
        assert_eq!(row["2024Q1actual"], 1);
    }

    #[test]
    fn test_empty_input_is_all_sentinels() {
        let periods = strings(&["2024Q1", "2024Q2"]);
        let out = build_dense_rows(
            &strings(&["E1", "E2"]),
            &periods,
            &dims(),
            &[],
            &EnrichedRecords::new(),
            &PivotOptions::default(),
        );

        assert_eq!(out.len(), 2);
        for row in &out {
            for p in &periods {
                assert_eq!(row[&cell_key(p, "target")], "");
                assert_eq!(row[&cell_key(p, "actual")], "");
                assert_eq!(row[&performance_group_key(p)], "no-data");
                assert_eq!(row[&performance_key(p)], "");
                assert_eq!(row[&style_key(p)]["backgroundColor"], "gray");
                assert_eq!(row[&target_flag_key(p)], 0);
                assert_eq!(row[&actual_flag_key(p)], 0);
            }
        }
    }

    #[test]
    fn test_direction_from_metadata() {
        let cells = rows(&[
            ["E1", "_", "target", "2024Q1", "100"],
            ["E1", "_", "actual", "2024Q1", "50"],
            ["E2", "_", "target", "2024Q1", "100"],
            ["E2", "_", "actual", "2024Q1", "50"],
        ]);
        let mut metadata = EnrichedRecords::new();
        metadata.insert(
            "E1".into(),
            EnrichedElementRecord::from([("isDescending".to_string(), "true".to_string())]),
        );

        let out = build_dense_rows(
            &strings(&["E1", "E2"]),
            &strings(&["2024Q1"]),
            &dims(),
            &cells,
            &metadata,
            &PivotOptions::default(),
        );

        assert_eq!(out[0]["2024Q1performance-group"], "achieved");
        assert_eq!(out[1]["2024Q1performance-group"], "not-achieved");
    }

    #[test]
    fn test_metadata_carried_but_identity_kept() {
        let mut metadata = EnrichedRecords::new();
        metadata.insert(
            "E1".into(),
            EnrichedElementRecord::from([
                ("id".to_string(), "E1".to_string()),
                ("name".to_string(), "ANC 1st visit".to_string()),
                ("degId".to_string(), "Grp1".to_string()),
            ]),
        );

        let out = build_dense_rows(
            &strings(&["E1"]),
            &strings(&["2024Q1"]),
            &dims(),
            &[],
            &metadata,
            &PivotOptions::default(),
        );

        assert_eq!(out[0]["name"], "ANC 1st visit");
        assert_eq!(out[0]["degId"], "Grp1");
        assert_eq!(out[0]["id"], "E1");
    }

    #[test]
    fn test_no_scoring_without_both_roles() {
        let cells = rows(&[["E1", "_", "coverage", "2024Q1", "12"]]);
        let out = build_dense_rows(
            &strings(&["E1"]),
            &strings(&["2024Q1"]),
            &strings(&["coverage", "target"]),
            &cells,
            &EnrichedRecords::new(),
            &PivotOptions::default(),
        );

        assert_eq!(out[0]["2024Q1.coverage"], "12");
        assert_eq!(out[0]["2024Q1.target"], "");
        assert!(out[0].get("2024Q1performance-group").is_none());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let cells = rows(&[
            ["E1", "_", "actual", "2024Q1", "1"],
            ["E1", "_", "actual", "2024Q1", "2"],
        ]);
        let index = SparseIndex::build(&cells);
        assert_eq!(index.get("E1", "2024Q1", "actual"), Some("1"));
        assert_eq!(index.get("E1", "2024Q2", "actual"), None);
    }

    #[test]
    fn test_cells_from_rows_skips_short_rows() {
        let raw = vec![
            strings(&["E1", "_", "actual", "2024Q1", "4"]),
            strings(&["E1", "_", "actual"]),
        ];
        let (cells, skipped) = cells_from_rows(&raw);
        assert_eq!(cells.len(), 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_zero_target_is_no_data_with_flags() {
        let cells = rows(&[
            ["E1", "_", "target", "2024Q1", "0"],
            ["E1", "_", "actual", "2024Q1", "40"],
        ]);
        let out = build_dense_rows(
            &strings(&["E1"]),
            &strings(&["2024Q1"]),
            &dims(),
            &cells,
            &EnrichedRecords::new(),
            &PivotOptions::default(),
        );

        assert_eq!(out[0]["2024Q1performance-group"], "no-data");
        assert_eq!(out[0]["2024Q1target"], 1);
        assert_eq!(out[0]["2024Q1actual"], 1);
    }
}
