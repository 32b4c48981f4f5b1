//! # Scorecard - taxonomy flattening and sparse-to-dense pivoting
//!
//! Scorecard reshapes a nested indicator taxonomy and sparse analytics rows
//! into dense, per-element rows with performance bands, ready for a
//! scorecard table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Taxonomy   │────▶│  Validate   │────▶│   Flatten   │────▶│  Enriched   │
//! │   (JSON)    │     │  (schema)   │     │  (layers)   │     │  records    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────▼──────┐
//! │ Navigation  │────▶│   Resolve   │────▶│   Select    │────▶│    Pivot    │
//! │  context    │     │   (scope)   │     │  entities   │     │ (+ classify)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//! ┌─────────────┐                                             ┌──────▼──────┐
//! │ Analytics   │────────────────────────────────────────────▶│ Dense rows  │
//! │ rows (CSV)  │                                             │ + summaries │
//! └─────────────┘                                             └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scorecard::{build_scorecard, PivotOptions, ScorecardRequest};
//!
//! let request: ScorecardRequest = serde_json::from_str(body)?;
//! let result = build_scorecard(&request, &PivotOptions::default());
//! println!("Built {} rows", result.rows.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (taxonomy, navigation context, bands)
//! - [`config`] - Environment-driven configuration
//! - [`parser`] - Taxonomy and analytics row loading with auto-detection
//! - [`transform`] - Flattening, scope resolution, pivot, classification
//! - [`validation`] - Taxonomy and row shape checks
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    InputError,
    InputResult,
    PipelineError,
    PipelineResult,
    ServerError,
    ServerResult,
    TaxonomyError,
    TaxonomyResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AttributeMap,
    AttributeRef,
    AttributeValue,
    Direction,
    EnrichedElementRecord,
    NavigationContext,
    PerformanceBand,
    SparseCell,
    Style,
    TaxonomyElement,
    TaxonomyGroup,
    TaxonomyGroupSet,
};

pub use config::EngineConfig;

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    is_valid,
    is_valid_taxonomy,
    parse_taxonomy,
    validate,
    validate_rows,
    validate_taxonomy,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    load_rows_file,
    load_taxonomy_file,
    parse_rows_bytes_auto,
    parse_rows_csv,
    parse_rows_json,
    taxonomy_from_value,
    RowsFormat,
    RowsParseResult,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::attributes::{merge_attributes, merge_layers};
pub use transform::flatten::{flatten_hierarchy, EnrichedRecords};
pub use transform::performance::{
    calculate_performance_ratio,
    classify,
    find_background,
    find_band,
    format_percentage,
    parse_value,
    Classification,
    Thresholds,
};
pub use transform::pivot::{build_dense_rows, cells_from_rows, DenseRow, PivotOptions, SparseIndex};
pub use transform::scope::{build_query_params, parse_deg, resolve_scope, DimensionScope, QueryParams};
pub use transform::summary::{summarize, PeriodSummary};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    build_scorecard,
    build_scorecard_from_files,
    select_entities,
    ScorecardRequest,
    ScorecardResult,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::server::{router, start_server};
pub use api::types::{error_response, ScorecardResponse};
