//! Error types for the scorecard reshaping engine.
//!
//! The engine itself is NaN-safe and has no fatal error surface; the types
//! here cover the edges around it:
//!
//! - [`TaxonomyError`] - Taxonomy shape problems (advisory, see [`crate::validation`])
//! - [`InputError`] - Loading taxonomy / analytics rows from files or bytes
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Taxonomy Errors
// =============================================================================

/// The taxonomy does not have the expected group-set shape.
#[derive(Debug, Clone, Error)]
pub enum TaxonomyError {
    /// Shape check failed (not an array, missing id, missing groups...).
    #[error("Invalid taxonomy: {}", errors.join("; "))]
    InvalidTaxonomy { errors: Vec<String> },

    /// Shape check passed but the structure could not be read.
    #[error("Unreadable taxonomy: {0}")]
    Unreadable(String),
}

impl TaxonomyError {
    /// Individual messages, suitable for display in an empty state.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::InvalidTaxonomy { errors } => errors.clone(),
            Self::Unreadable(msg) => vec![msg.clone()],
        }
    }
}

// =============================================================================
// Input Errors
// =============================================================================

/// Errors while loading engine inputs.
#[derive(Debug, Error)]
pub enum InputError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV could not be parsed.
    #[error("Invalid CSV at line {line}: {message}")]
    Csv { line: usize, message: String },

    /// Analytics rows do not have the expected shape.
    #[error("Invalid analytics rows: {}", errors.join("; "))]
    InvalidRows { errors: Vec<String> },

    /// Empty file.
    #[error("Input is empty")]
    Empty,
}

impl From<csv::Error> for InputError {
    fn from(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0);
        InputError::Csv {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// [`crate::transform::pipeline::build_scorecard`] never fails on a bad
/// taxonomy (it degrades to an empty dataset); this type is returned by the
/// file-based entry points that also have to load their inputs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Taxonomy error.
    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    /// Input loading error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Could not bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for taxonomy checks.
pub type TaxonomyResult<T> = Result<T, TaxonomyError>;

/// Result type for input loading.
pub type InputResult<T> = Result<T, InputError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
