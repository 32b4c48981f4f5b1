//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded by the binary
//! via `dotenvy`), falling back to defaults. CLI flags override them.
//!
//! | Variable                         | Default        |
//! |----------------------------------|----------------|
//! | `SCORECARD_TARGET_DIMENSION`     | `target`       |
//! | `SCORECARD_ACTUAL_DIMENSION`     | `actual`       |
//! | `SCORECARD_DIRECTION_ATTRIBUTE`  | `isDescending` |
//! | `SCORECARD_DEFAULT_DESCENDING`   | `false`        |
//! | `SCORECARD_MODERATE_THRESHOLD`   | `75`           |
//! | `SCORECARD_ACHIEVED_THRESHOLD`   | `100`          |
//! | `SCORECARD_PORT`                 | `3000`         |

use serde::{Deserialize, Serialize};

use crate::api::logs::log_warning;
use crate::models::Direction;
use crate::transform::performance::Thresholds;
use crate::transform::pivot::PivotOptions;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Engine and server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub pivot: PivotOptions,
    pub port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pivot: PivotOptions::default(),
            port: DEFAULT_PORT,
        }
    }
}

impl EngineConfig {
    /// Build from process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let pivot = &mut config.pivot;

        if let Some(v) = lookup("SCORECARD_TARGET_DIMENSION") {
            pivot.target_dimension = v;
        }
        if let Some(v) = lookup("SCORECARD_ACTUAL_DIMENSION") {
            pivot.actual_dimension = v;
        }
        if let Some(v) = lookup("SCORECARD_DIRECTION_ATTRIBUTE") {
            pivot.direction_attribute = v;
        }
        if let Some(v) = lookup("SCORECARD_DEFAULT_DESCENDING") {
            pivot.default_direction = Direction::from_flag(&v);
        }

        let moderate = parse_var(&lookup, "SCORECARD_MODERATE_THRESHOLD");
        let achieved = parse_var(&lookup, "SCORECARD_ACHIEVED_THRESHOLD");
        pivot.thresholds = Thresholds {
            moderate: moderate.unwrap_or(pivot.thresholds.moderate),
            achieved: achieved.unwrap_or(pivot.thresholds.achieved),
        };
        if pivot.thresholds.moderate > pivot.thresholds.achieved {
            log_warning(format!(
                "Moderate threshold {} is above achieved threshold {}, using defaults",
                pivot.thresholds.moderate, pivot.thresholds.achieved
            ));
            pivot.thresholds = Thresholds::default();
        }

        if let Some(port) = parse_var(&lookup, "SCORECARD_PORT") {
            config.port = port;
        }

        config
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log_warning(format!("Ignoring {}={:?}: not a valid value", key, raw));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[]));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.pivot.thresholds.moderate, 75.0);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("SCORECARD_TARGET_DIMENSION", "tgt"),
            ("SCORECARD_DEFAULT_DESCENDING", "true"),
            ("SCORECARD_MODERATE_THRESHOLD", "60"),
            ("SCORECARD_PORT", "8080"),
        ]));
        assert_eq!(config.pivot.target_dimension, "tgt");
        assert_eq!(config.pivot.actual_dimension, "actual");
        assert_eq!(config.pivot.default_direction, Direction::Descending);
        assert_eq!(config.pivot.thresholds.moderate, 60.0);
        assert_eq!(config.pivot.thresholds.achieved, 100.0);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("SCORECARD_PORT", "not-a-port"),
            ("SCORECARD_MODERATE_THRESHOLD", "120"),
        ]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.pivot.thresholds, Thresholds::default());
    }
}
