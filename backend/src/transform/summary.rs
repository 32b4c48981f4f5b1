//! Per-period band counts, as consumed by report generation.

use serde::{Deserialize, Serialize};

use super::pivot::{performance_group_key, DenseRow};
use crate::models::PerformanceBand;

/// Band counts for one period.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period: String,
    /// Rows that were scored for this period.
    pub total: usize,
    pub achieved: usize,
    pub moderate: usize,
    pub not_achieved: usize,
    pub no_data: usize,
    /// Percentage of scored rows with data that reached the achieved band.
    pub achieved_share: Option<f64>,
}

impl PeriodSummary {
    fn count(&mut self, band: PerformanceBand) {
        self.total += 1;
        match band {
            PerformanceBand::Achieved => self.achieved += 1,
            PerformanceBand::Moderate => self.moderate += 1,
            PerformanceBand::NotAchieved => self.not_achieved += 1,
            PerformanceBand::NoData => self.no_data += 1,
        }
    }

    /// Rows for which a ratio could be computed.
    pub fn with_data(&self) -> usize {
        self.total - self.no_data
    }
}

/// Summarize dense rows per period. Rows without a band for a period are not counted.
pub fn summarize(rows: &[DenseRow], periods: &[String]) -> Vec<PeriodSummary> {
    periods
        .iter()
        .map(|period| {
            let key = performance_group_key(period);
            let mut summary = PeriodSummary {
                period: period.clone(),
                ..Default::default()
            };

            for row in rows {
                let band = row
                    .get(&key)
                    .and_then(|v| v.as_str())
                    .and_then(band_from_label);
                if let Some(band) = band {
                    summary.count(band);
                }
            }

            let with_data = summary.with_data();
            if with_data > 0 {
                summary.achieved_share = Some(summary.achieved as f64 * 100.0 / with_data as f64);
            }
            summary
        })
        .collect()
}

fn band_from_label(label: &str) -> Option<PerformanceBand> {
    PerformanceBand::ALL.into_iter().find(|b| b.label() == label)
}
