//! Performance classification.
//!
//! A ratio of actual to target (as a percentage) is mapped to a band:
//!
//! | ratio        | ascending     | descending    |
//! |--------------|---------------|---------------|
//! | NaN          | no-data       | no-data       |
//! | `< 75`       | not-achieved  | achieved      |
//! | `[75, 100)`  | moderate      | moderate      |
//! | `>= 100`     | achieved      | not-achieved  |
//!
//! Nothing here panics: missing or unparseable operands and a zero target
//! all degrade to `NaN` and therefore to no-data.

use serde::{Deserialize, Serialize};

use crate::models::{Direction, PerformanceBand, Style};

/// Band boundaries, as ratio percentages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Lower bound (inclusive) of the moderate band.
    pub moderate: f64,
    /// Lower bound (inclusive) of the top band.
    pub achieved: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            moderate: 75.0,
            achieved: 100.0,
        }
    }
}

/// Outcome of classifying one actual/target pair.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// `NaN` serializes as `null`.
    pub ratio: f64,
    pub band: PerformanceBand,
    pub style: Style,
}

/// Parse a raw analytics value. Blank, non-numeric or non-finite input
/// (`"inf"`, `"NaN"`) yields `NaN`.
pub fn parse_value(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(f64::NAN)
}

/// `actual * 100 / target`, or `NaN` when either operand is `NaN` or the target is zero.
pub fn calculate_performance_ratio(actual: f64, target: f64) -> f64 {
    if actual.is_nan() || target.is_nan() || target == 0.0 {
        return f64::NAN;
    }
    (actual * 100.0) / target
}

/// Map a ratio onto a band using the default thresholds.
pub fn find_band(ratio: f64, direction: Direction) -> PerformanceBand {
    find_band_with(ratio, direction, &Thresholds::default())
}

/// Map a ratio onto a band.
pub fn find_band_with(ratio: f64, direction: Direction, thresholds: &Thresholds) -> PerformanceBand {
    if ratio.is_nan() {
        return PerformanceBand::NoData;
    }

    let (low, high) = if direction.is_descending() {
        (PerformanceBand::Achieved, PerformanceBand::NotAchieved)
    } else {
        (PerformanceBand::NotAchieved, PerformanceBand::Achieved)
    };

    if ratio < thresholds.moderate {
        low
    } else if ratio < thresholds.achieved {
        PerformanceBand::Moderate
    } else {
        high
    }
}

/// Display style for a ratio.
pub fn find_background(ratio: f64, direction: Direction) -> Style {
    find_band(ratio, direction).style()
}

/// Classify an actual/target pair.
pub fn classify(actual: f64, target: f64, direction: Direction, thresholds: &Thresholds) -> Classification {
    let ratio = calculate_performance_ratio(actual, target);
    let band = find_band_with(ratio, direction, thresholds);
    Classification {
        ratio,
        band,
        style: band.style(),
    }
}

/// Ratio range `[from, to)` covered by a band for the given direction.
///
/// No-data has no numeric range and yields `None`.
pub fn band_range(band: PerformanceBand, direction: Direction, thresholds: &Thresholds) -> Option<(f64, f64)> {
    let lower = (f64::NEG_INFINITY, thresholds.moderate);
    let middle = (thresholds.moderate, thresholds.achieved);
    let upper = (thresholds.achieved, f64::INFINITY);

    match (band, direction) {
        (PerformanceBand::NoData, _) => None,
        (PerformanceBand::Moderate, _) => Some(middle),
        (PerformanceBand::Achieved, Direction::Ascending) => Some(upper),
        (PerformanceBand::Achieved, Direction::Descending) => Some(lower),
        (PerformanceBand::NotAchieved, Direction::Ascending) => Some(lower),
        (PerformanceBand::NotAchieved, Direction::Descending) => Some(upper),
    }
}

/// Display `ratio / 100` as a percentage, e.g. `80` → `"80%"`.
///
/// Whole percent, half away from zero, comma thousands separators.
/// `NaN` renders as the empty string.
pub fn format_percentage(ratio: f64) -> String {
    if !ratio.is_finite() {
        return String::new();
    }

    let rounded = ratio.round();
    let negative = rounded < 0.0;
    let digits = format!("{}", rounded.abs() as u64);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}%", grouped)
    } else {
        format!("{}%", grouped)
    }
}
