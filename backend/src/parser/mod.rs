//! Input loading with format, encoding and delimiter auto-detection.
//!
//! Two inputs are read here:
//!
//! - the taxonomy: JSON, either a bare group-set array or a metadata
//!   response wrapping it under `dataElementGroupSets`
//! - the analytics rows: JSON (bare array or a response object with `rows`)
//!   or a CSV export whose first five columns are
//!   `entity, unused, dimension, period, value`

use serde_json::Value;
use std::path::Path;

use crate::error::{InputError, InputResult};
use crate::validation::validate_rows;

/// Key under which metadata responses wrap the group-sets.
pub const GROUP_SETS_KEY: &str = "dataElementGroupSets";

/// Where a set of analytics rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowsFormat {
    Json,
    Csv,
}

/// Parsed analytics rows with metadata
#[derive(Debug, Clone)]
pub struct RowsParseResult {
    /// Raw rows, one `Vec` of columns per fact
    pub rows: Vec<Vec<String>>,
    pub format: RowsFormat,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter (CSV only)
    pub delimiter: Option<char>,
    /// Column headers (CSV only)
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()
        }
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV rows with an explicit delimiter. The first line is a header.
///
/// Returns the headers and the data rows, cells trimmed. Blank lines are skipped.
pub fn parse_rows_csv(content: &str, delimiter: char) -> InputResult<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(InputError::Empty);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(String::from).collect());
    }

    Ok((headers, rows))
}

/// Read rows from an analytics JSON value: a bare array, or an object with `rows`.
pub fn parse_rows_json(value: &Value) -> InputResult<Vec<Vec<String>>> {
    let rows = match value {
        Value::Object(obj) => obj.get("rows").cloned().unwrap_or(Value::Array(Vec::new())),
        other => other.clone(),
    };
    validate_rows(&rows)?;
    Ok(serde_json::from_value(rows)?)
}

/// Parse analytics rows from bytes, detecting JSON vs CSV, encoding and delimiter.
pub fn parse_rows_bytes_auto(bytes: &[u8]) -> InputResult<RowsParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();

    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)?;
        return Ok(RowsParseResult {
            rows: parse_rows_json(&value)?,
            format: RowsFormat::Json,
            encoding,
            delimiter: None,
            headers: Vec::new(),
        });
    }

    let delimiter = detect_delimiter(trimmed);
    let (headers, rows) = parse_rows_csv(trimmed, delimiter)?;
    Ok(RowsParseResult {
        rows,
        format: RowsFormat::Csv,
        encoding,
        delimiter: Some(delimiter),
        headers,
    })
}

/// Load analytics rows from a JSON or CSV file.
pub fn load_rows_file<P: AsRef<Path>>(path: P) -> InputResult<RowsParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_rows_bytes_auto(&bytes)
}

/// Read a taxonomy document, unwrapping a metadata response if needed.
///
/// The returned value is not validated; see [`crate::validation::validate_taxonomy`].
pub fn taxonomy_from_value(value: Value) -> Value {
    match value {
        Value::Object(mut obj) if obj.contains_key(GROUP_SETS_KEY) => {
            obj.remove(GROUP_SETS_KEY).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Load a taxonomy JSON file.
pub fn load_taxonomy_file<P: AsRef<Path>>(path: P) -> InputResult<Value> {
    let bytes = std::fs::read(path.as_ref())?;
    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding);
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Err(InputError::Empty);
    }
    let value: Value = serde_json::from_str(content)?;
    Ok(taxonomy_from_value(value))
}
