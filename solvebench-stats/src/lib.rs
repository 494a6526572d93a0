#![warn(missing_docs)]
//! Solvebench Stats - Distribution Summaries
//!
//! Statistics backing the harness's distribution plots:
//! - Quartile computation with linear interpolation between nearest ranks
//! - Box-plot geometry (median, IQR box, whisker fences, outlier points)
//! - Per-metric location summaries for the session report
//!
//! The box-plot convention is the standard one: whiskers extend to the most
//! extreme observations within 1.5×IQR of the box, everything beyond is an
//! outlier point. Outliers are classified, never dropped — for solver timing
//! data the tail IS the signal.

mod boxplot;
mod quartiles;
mod summary;

pub use boxplot::{BoxStats, compute_box_stats};
pub use quartiles::{Quartiles, compute_percentile, compute_quartiles};
pub use summary::{MetricSummary, compute_metric_summary};
