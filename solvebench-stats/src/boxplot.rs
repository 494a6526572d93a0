//! Box-Plot Geometry
//!
//! Reduces a sample set to the five numbers a box plot draws, plus the
//! individual outlier points beyond the whisker fences.
//!
//! Whisker convention: fences sit at Q1 - 1.5×IQR and Q3 + 1.5×IQR, and
//! each whisker is clamped to the most extreme observation inside its
//! fence. Observations beyond a fence are reported as outliers and drawn
//! as points, never removed from the data.

use crate::quartiles::compute_quartiles;

/// Standard whisker reach in multiples of the IQR
pub const WHISKER_REACH: f64 = 1.5;

/// Everything needed to draw one box
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    /// 25th percentile (bottom of the box)
    pub q1: f64,
    /// Median line
    pub median: f64,
    /// 75th percentile (top of the box)
    pub q3: f64,
    /// Lowest observation within the lower fence
    pub whisker_low: f64,
    /// Highest observation within the upper fence
    pub whisker_high: f64,
    /// Observations beyond the fences, in input order
    pub outliers: Vec<f64>,
    /// Number of observations summarized
    pub sample_count: usize,
}

impl BoxStats {
    /// Smallest value the plot must show (whisker or outlier)
    pub fn plot_min(&self) -> f64 {
        self.outliers
            .iter()
            .copied()
            .fold(self.whisker_low, f64::min)
    }

    /// Largest value the plot must show (whisker or outlier)
    pub fn plot_max(&self) -> f64 {
        self.outliers
            .iter()
            .copied()
            .fold(self.whisker_high, f64::max)
    }
}

/// Compute box-plot stats for a sample set
///
/// Returns `None` for an empty slice — a (level, metric) pair with no
/// valid observations has nothing to draw.
pub fn compute_box_stats(samples: &[f64]) -> Option<BoxStats> {
    if samples.is_empty() {
        return None;
    }

    let quartiles = compute_quartiles(samples);
    let reach = WHISKER_REACH * quartiles.iqr();
    let lower_fence = quartiles.q1 - reach;
    let upper_fence = quartiles.q3 + reach;

    let mut whisker_low = f64::INFINITY;
    let mut whisker_high = f64::NEG_INFINITY;
    let mut outliers = Vec::new();

    for &sample in samples {
        if sample < lower_fence || sample > upper_fence {
            outliers.push(sample);
        } else {
            whisker_low = whisker_low.min(sample);
            whisker_high = whisker_high.max(sample);
        }
    }

    // All observations can fall outside the fences only when IQR is NaN,
    // which cannot happen for non-empty input; still, collapse the
    // whiskers onto the box rather than emit infinities.
    if whisker_low > whisker_high {
        whisker_low = quartiles.q1;
        whisker_high = quartiles.q3;
    }

    Some(BoxStats {
        q1: quartiles.q1,
        median: quartiles.median,
        q3: quartiles.q3,
        whisker_low,
        whisker_high,
        outliers,
        sample_count: samples.len(),
    })
}
