//! Transformation module.
//!
//! This module turns a taxonomy and sparse analytics rows into a scorecard:
//! - Attributes: attribute-value merging and layer precedence
//! - Flatten: hierarchy to per-element enriched records
//! - Scope: navigation context to in-scope groups and query params
//! - Performance: ratio, band and style classification
//! - Pivot: sparse rows to dense rows
//! - Summary: per-period band counts
//! - Pipeline: all of the above in one call

pub mod attributes;
pub mod flatten;
pub mod performance;
pub mod pipeline;
pub mod pivot;
pub mod scope;
pub mod summary;

pub use attributes::{merge_attributes, merge_layers};
pub use flatten::{flatten_hierarchy, EnrichedRecords};
pub use performance::{
    calculate_performance_ratio, classify, find_background, find_band, format_percentage,
    Classification, Thresholds,
};
pub use pipeline::*;
pub use pivot::{build_dense_rows, DenseRow, PivotOptions, SparseIndex};
pub use scope::{build_query_params, parse_deg, resolve_scope, DimensionScope, QueryParams};
pub use summary::{summarize, PeriodSummary};
