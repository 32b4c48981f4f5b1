//! JSON Schema shape checks for engine inputs.
//!
//! The checks are advisory: callers use them to decide whether to process
//! an input or fall back to an empty dataset. Nothing here panics on bad
//! input.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from `schemas/` directory:
//! - `taxonomy.json` - array of group-sets, each with a string `id` and a `dataElementGroups` array
//! - `analytics-rows.json` - array of rows of at least five strings
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use scorecard::{is_valid_taxonomy, parse_taxonomy};
//!
//! let raw = json!([{ "id": "G1", "dataElementGroups": [] }]);
//! assert!(is_valid_taxonomy(&raw));
//! let group_sets = parse_taxonomy(&raw).unwrap();
//! assert_eq!(group_sets[0].id, "G1");
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{InputError, TaxonomyError};
use crate::models::TaxonomyGroupSet;

static TAXONOMY_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/taxonomy.json"))
        .expect("Invalid embedded schema")
});

static ROWS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/analytics-rows.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Boolean form of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Check the taxonomy shape.
///
/// Fails with [`TaxonomyError::InvalidTaxonomy`] when the input is not an
/// array, or a group-set lacks a string `id` or a `dataElementGroups` array.
pub fn validate_taxonomy(data: &Value) -> Result<(), TaxonomyError> {
    validate(&TAXONOMY_SCHEMA, data).map_err(|errors| TaxonomyError::InvalidTaxonomy { errors })
}

/// Quick check against the taxonomy schema.
pub fn is_valid_taxonomy(data: &Value) -> bool {
    is_valid(&TAXONOMY_SCHEMA, data)
}

/// Validate, then read the taxonomy into group-sets.
pub fn parse_taxonomy(data: &Value) -> Result<Vec<TaxonomyGroupSet>, TaxonomyError> {
    validate_taxonomy(data)?;
    serde_json::from_value(data.clone()).map_err(|e| TaxonomyError::Unreadable(e.to_string()))
}

/// Check analytics rows are arrays of at least five strings.
pub fn validate_rows(data: &Value) -> Result<(), InputError> {
    validate(&ROWS_SCHEMA, data).map_err(|errors| InputError::InvalidRows { errors })
}
