//! High-level pipeline API for building a scorecard.
//!
//! This module combines all steps:
//! taxonomy validation, scope resolution, flattening, pivoting and
//! summarizing.
//!
//! # Example
//!
//! ```rust,ignore
//! use scorecard::{build_scorecard, PivotOptions, ScorecardRequest};
//!
//! let request: ScorecardRequest = serde_json::from_str(body)?;
//! let result = build_scorecard(&request, &PivotOptions::default());
//! println!("{} rows", result.rows.len());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use super::flatten::{flatten_hierarchy, EnrichedRecords};
use super::pivot::{build_dense_rows, cells_from_rows, DenseRow, PivotOptions};
use super::scope::{build_query_params, resolve_scope, DimensionScope, QueryParams};
use super::summary::{summarize, PeriodSummary};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::PipelineResult;
use crate::models::{NavigationContext, TaxonomyGroupSet};
use crate::parser::{load_rows_file, load_taxonomy_file};
use crate::validation::parse_taxonomy;

/// Everything needed for one scorecard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardRequest {
    /// Group-set array as delivered by the metadata API (validated here).
    pub taxonomy: Value,
    /// Analytics rows: `[entity, unused, dimension, period, value]`.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub context: NavigationContext,
    /// Secondary dimensions to pivot; defaults to the target and actual dimensions.
    #[serde(default)]
    pub dimensions: Option<Vec<String>>,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardResult {
    pub scope: DimensionScope,
    /// Parameters for the upstream analytics query
    pub query: QueryParams,
    pub periods: Vec<String>,
    pub dimensions: Vec<String>,
    /// Enriched metadata for every element in the taxonomy
    pub records: EnrichedRecords,
    /// One dense row per in-scope element
    pub rows: Vec<DenseRow>,
    pub summaries: Vec<PeriodSummary>,
    /// Taxonomy problems; a non-empty list means the dataset was emptied
    pub errors: Vec<String>,
    /// Analytics rows ignored for having fewer than five columns
    pub skipped_rows: usize,
}

/// Elements in scope: those selected directly, plus every element listed
/// under an in-scope group (including groups of group-sets nested below it).
///
/// Membership comes from the taxonomy rather than the enriched records, whose
/// `degId` only names the last group an element was seen under. Output
/// follows the order of `records`.
pub fn select_entities(
    group_sets: &[TaxonomyGroupSet],
    records: &EnrichedRecords,
    scope: &DimensionScope,
) -> Vec<String> {
    let in_scope: HashSet<&str> = scope.data_element_groups.iter().map(String::as_str).collect();

    let mut selected = HashSet::new();
    for group_set in group_sets {
        collect_group_set(group_set, &in_scope, false, &mut selected);
    }

    records
        .keys()
        .filter(|id| in_scope.contains(id.as_str()) || selected.contains(id.as_str()))
        .cloned()
        .collect()
}

fn collect_group_set<'a>(
    group_set: &'a TaxonomyGroupSet,
    in_scope: &HashSet<&str>,
    inherited: bool,
    selected: &mut HashSet<&'a str>,
) {
    for group in &group_set.groups {
        let included = inherited || in_scope.contains(group.id.as_str());
        if included {
            selected.extend(group.elements.iter().map(|e| e.id.as_str()));
        }
        for nested in &group.group_sets {
            collect_group_set(nested, in_scope, included, selected);
        }
    }
}

/// Build a scorecard. Never fails: a malformed taxonomy yields an empty
/// dataset with the problems listed in `errors`.
pub fn build_scorecard(request: &ScorecardRequest, options: &PivotOptions) -> ScorecardResult {
    log_info("📖 Reading taxonomy...");
    let (group_sets, errors): (Vec<TaxonomyGroupSet>, Vec<String>) = match parse_taxonomy(&request.taxonomy) {
        Ok(group_sets) => {
            log_success(format!("{} group-sets", group_sets.len()));
            (group_sets, Vec::new())
        }
        Err(e) => {
            log_warning(format!("{}, continuing with an empty dataset", e));
            (Vec::new(), e.messages())
        }
    };

    let scope = resolve_scope(&request.context, &group_sets);
    let query = build_query_params(&scope, &request.context);
    log_info(format!(
        "🔎 Scope: {} group-sets, {} groups",
        scope.group_sets.len(),
        scope.data_element_groups.len()
    ));

    let records = flatten_hierarchy(&group_sets);
    log_success(format!("{} enriched elements", records.len()));

    let entities = select_entities(&group_sets, &records, &scope);
    let periods = request.context.period_list();
    let dimensions = request
        .dimensions
        .clone()
        .unwrap_or_else(|| vec![options.target_dimension.clone(), options.actual_dimension.clone()]);

    let (cells, skipped_rows) = cells_from_rows(&request.rows);
    if skipped_rows > 0 {
        log_warning(format!("{} analytics rows skipped (fewer than 5 columns)", skipped_rows));
    }

    log_info(format!(
        "⚙️  Pivoting {} elements × {} periods × {} dimensions from {} facts",
        entities.len(),
        periods.len(),
        dimensions.len(),
        cells.len()
    ));
    let rows = build_dense_rows(&entities, &periods, &dimensions, &cells, &records, options);
    let summaries = summarize(&rows, &periods);
    log_success(format!("{} dense rows", rows.len()));

    ScorecardResult {
        scope,
        query,
        periods,
        dimensions,
        records,
        rows,
        summaries,
        errors,
        skipped_rows,
    }
}

/// Load the taxonomy and analytics rows from files, then build the scorecard.
pub fn build_scorecard_from_files(
    taxonomy_path: &Path,
    rows_path: Option<&Path>,
    context: NavigationContext,
    dimensions: Option<Vec<String>>,
    options: &PivotOptions,
) -> PipelineResult<ScorecardResult> {
    let taxonomy = load_taxonomy_file(taxonomy_path)?;

    let rows = match rows_path {
        Some(path) => {
            let parsed = load_rows_file(path)?;
            log_success(format!(
                "Read {} analytics rows ({:?}, {})",
                parsed.rows.len(),
                parsed.format,
                parsed.encoding
            ));
            parsed.rows
        }
        None => Vec::new(),
    };

    let request = ScorecardRequest {
        taxonomy,
        rows,
        context,
        dimensions,
    };
    Ok(build_scorecard(&request, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn taxonomy() -> Value {
        json!([
            {
                "id": "G1",
                "name": "Maternal health",
                "attributeValues": [
                    { "value": "P1", "attribute": { "id": "aProg", "name": "programId" } }
                ],
                "dataElementGroups": [
                    {
                        "id": "Grp1",
                        "name": "ANC",
                        "attributeValues": [
                            { "value": "true", "attribute": { "id": "aDesc", "name": "isDescending" } }
                        ],
                        "dataElements": [
                            { "id": "E1", "name": "ANC 1st visit", "attributeValues": [
                                { "value": "false", "attribute": { "id": "aDesc", "name": "isDescending" } }
                            ]},
                            { "id": "E2", "name": "Maternal deaths" }
                        ]
                    }
                ]
            },
            {
                "id": "G2",
                "name": "Immunization",
                "attributeValues": [
                    { "value": "P2", "attribute": { "id": "aProg", "name": "programId" } }
                ],
                "dataElementGroups": [
                    { "id": "Grp2", "dataElements": [{ "id": "E3", "name": "BCG" }] }
                ]
            }
        ])
    }

    fn rows() -> Vec<Vec<String>> {
        [
            ["E1", "_", "target", "2024Q1", "50"],
            ["E1", "_", "actual", "2024Q1", "40"],
            ["E2", "_", "target", "2024Q1", "10"],
            ["E2", "_", "actual", "2024Q1", "5"],
            ["E3", "_", "actual", "2024Q1", "7"],
        ]
        .iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect()
    }

    #[test]
    fn test_program_scorecard() {
        let request = ScorecardRequest {
            taxonomy: taxonomy(),
            rows: rows(),
            context: NavigationContext {
                program: Some("P1".into()),
                periods: Some("2024Q1;2024Q2".into()),
                org_unit: Some("OU1".into()),
                ..Default::default()
            },
            dimensions: None,
        };

        let result = build_scorecard(&request, &PivotOptions::default());

        assert!(result.errors.is_empty());
        assert_eq!(result.scope.group_sets, vec!["G1"]);
        assert_eq!(result.scope.data_element_groups, vec!["Grp1"]);
        assert_eq!(result.query.deg, "DE_GROUP-Grp1");
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.rows.len(), 2);

        // E1 overrides the group's descending flag; E2 inherits it
        let e1 = &result.rows[0];
        assert_eq!(e1["id"], "E1");
        assert_eq!(e1["2024Q1performance-group"], "moderate");
        assert_eq!(e1["2024Q2performance-group"], "no-data");
        let e2 = &result.rows[1];
        assert_eq!(e2["2024Q1performance"], "50%");
        assert_eq!(e2["2024Q1performance-group"], "achieved");

        assert_eq!(result.summaries.len(), 2);
        assert_eq!(result.summaries[0].moderate, 1);
        assert_eq!(result.summaries[0].achieved, 1);
        assert_eq!(result.summaries[1].no_data, 2);
    }

    #[test]
    fn test_direct_element_selection() {
        let request = ScorecardRequest {
            taxonomy: taxonomy(),
            rows: rows(),
            context: NavigationContext {
                element: Some("E3".into()),
                element_group_set: Some("G2".into()),
                periods: Some("2024Q1".into()),
                ..Default::default()
            },
            dimensions: None,
        };

        let result = build_scorecard(&request, &PivotOptions::default());
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["id"], "E3");
        assert_eq!(result.rows[0]["2024Q1.actual"], "7");
        assert_eq!(result.rows[0]["2024Q1target"], 0);
        assert_eq!(result.rows[0]["2024Q1performance-group"], "no-data");
    }

    #[test]
    fn test_invalid_taxonomy_yields_empty_dataset() {
        let request = ScorecardRequest {
            taxonomy: json!({ "not": "a list" }),
            rows: rows(),
            context: NavigationContext::default(),
            dimensions: None,
        };

        let result = build_scorecard(&request, &PivotOptions::default());
        assert!(!result.errors.is_empty());
        assert!(result.records.is_empty());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_short_rows_counted() {
        let mut short = rows();
        short.push(vec!["E1".into(), "_".into()]);
        let request = ScorecardRequest {
            taxonomy: taxonomy(),
            rows: short,
            ..Default::default()
        };

        let result = build_scorecard(&request, &PivotOptions::default());
        assert_eq!(result.skipped_rows, 1);
    }

    #[test]
    fn test_select_entities() {
        let group_sets = parse_taxonomy(&taxonomy()).unwrap();
        let records = flatten_hierarchy(&group_sets);
        let scope = DimensionScope {
            group_sets: vec![],
            data_element_groups: vec!["Grp2".into(), "E1".into()],
        };
        assert_eq!(select_entities(&group_sets, &records, &scope), vec!["E1", "E3"]);
    }

    #[test]
    fn test_fan_out_element_kept_by_in_scope_group() {
        // E1 is listed under both programs; its record's degId ends up as Grp2
        let taxonomy = json!([
            {
                "id": "G1",
                "attributeValues": [{ "value": "P1", "attribute": { "id": "aProg", "name": "programId" } }],
                "dataElementGroups": [{ "id": "Grp1", "dataElements": [{ "id": "E1" }] }]
            },
            {
                "id": "G2",
                "attributeValues": [{ "value": "P2", "attribute": { "id": "aProg", "name": "programId" } }],
                "dataElementGroups": [{ "id": "Grp2", "dataElements": [{ "id": "E1" }, { "id": "E2" }] }]
            }
        ]);
        let request = ScorecardRequest {
            taxonomy,
            rows: rows(),
            context: NavigationContext {
                program: Some("P1".into()),
                periods: Some("2024Q1".into()),
                ..Default::default()
            },
            dimensions: None,
        };

        let result = build_scorecard(&request, &PivotOptions::default());
        assert_eq!(result.scope.data_element_groups, vec!["Grp1"]);
        assert_eq!(result.records["E1"]["degId"], "Grp2");
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["id"], "E1");
        assert_eq!(result.rows[0]["2024Q1performance"], "80%");
    }

    #[test]
    fn test_nested_group_set_elements() {
        let taxonomy = json!([
            {
                "id": "G1",
                "name": "Maternal health",
                "dataElementGroups": [
                    {
                        "id": "Grp1",
                        "name": "ANC",
                        "attributeValues": [{ "value": "true", "attribute": { "id": "aDesc", "name": "isDescending" } }],
                        "dataElements": [],
                        "groupSets": [
                            {
                                "id": "Inner",
                                "dataElementGroups": [
                                    { "id": "GrpInner", "dataElements": [{ "id": "E2", "name": "Maternal deaths" }] }
                                ]
                            }
                        ]
                    }
                ]
            }
        ]);
        let request = ScorecardRequest {
            taxonomy,
            rows: rows(),
            context: NavigationContext {
                element_group_set: Some("G1".into()),
                periods: Some("2024Q1".into()),
                ..Default::default()
            },
            dimensions: None,
        };

        let result = build_scorecard(&request, &PivotOptions::default());
        assert_eq!(result.scope.data_element_groups, vec!["Grp1"]);
        assert_eq!(result.rows.len(), 1);
        let e2 = &result.rows[0];
        assert_eq!(e2["id"], "E2");
        assert_eq!(e2["degsId"], "Inner");
        assert_eq!(e2["degsName"], "");
        assert_eq!(e2["degId"], "GrpInner");
        // Descending inherited from the enclosing group: 50% is achieved
        assert_eq!(e2["2024Q1performance-group"], "achieved");
    }

    #[test]
    fn test_malformed_nested_node_keeps_elements() {
        let taxonomy = json!([
            {
                "id": "G1",
                "dataElementGroups": [
                    {
                        "id": "Grp1",
                        "attributeValues": null,
                        "dataElements": [
                            { "id": "E1", "name": "ANC 1st visit", "attributeValues": [
                                { "value": null, "attribute": { "id": "aNote", "name": "note" } },
                                { "value": 3, "attribute": { "id": "aRank", "name": "rank" } }
                            ]}
                        ]
                    }
                ]
            }
        ]);
        let request = ScorecardRequest {
            taxonomy,
            rows: rows(),
            context: NavigationContext {
                periods: Some("2024Q1".into()),
                ..Default::default()
            },
            dimensions: None,
        };

        let result = build_scorecard(&request, &PivotOptions::default());
        assert!(result.errors.is_empty());
        assert_eq!(result.records["E1"]["name"], "ANC 1st visit");
        assert_eq!(result.records["E1"]["rank"], "3");
        assert_eq!(result.records["E1"]["note"], "");
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["2024Q1performance-group"], "moderate");
    }

    #[test]
    fn test_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let taxonomy_path = dir.path().join("taxonomy.json");
        let rows_path = dir.path().join("rows.csv");
        std::fs::write(&taxonomy_path, taxonomy().to_string()).unwrap();
        std::fs::write(&rows_path, "dx,co,dim,pe,value\nE3,_,target,2024Q1,10\nE3,_,actual,2024Q1,12\n").unwrap();

        let context = NavigationContext {
            program: Some("P2".into()),
            periods: Some("2024Q1".into()),
            ..Default::default()
        };
        let result = build_scorecard_from_files(
            &taxonomy_path,
            Some(&rows_path),
            context,
            None,
            &PivotOptions::default(),
        )
        .unwrap();

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["2024Q1performance"], "120%");
        assert_eq!(result.rows[0]["2024Q1performance-group"], "achieved");
    }
}
