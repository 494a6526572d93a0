//! Location Summaries
//!
//! Mean/median/min/max over one metric's observations, used by the
//! session summary report. No outlier cleaning is applied here: the
//! summary describes the data exactly as measured.

use crate::quartiles::compute_percentile;

/// Location summary for one metric across a level's trials
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Median (50th percentile)
    pub median: f64,
    /// Smallest observation
    pub min: f64,
    /// Largest observation
    pub max: f64,
    /// Number of observations
    pub sample_count: usize,
}

/// Compute a location summary, or `None` when there are no observations
pub fn compute_metric_summary(samples: &[f64]) -> Option<MetricSummary> {
    if samples.is_empty() {
        return None;
    }

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let median = compute_percentile(samples, 50.0);
    let min = samples
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let max = samples
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    Some(MetricSummary {
        mean,
        median,
        min,
        max,
        sample_count: samples.len(),
    })
}
