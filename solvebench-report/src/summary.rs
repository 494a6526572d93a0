//! Session Summary
//!
//! Machine-readable recap of one run session: which solver ran, when,
//! and per-level location stats for every metric that produced data.
//! Serialized as pretty JSON next to the CSV tables.

use chrono::{DateTime, Utc};
use serde::Serialize;
use solvebench_stats::{MetricSummary, compute_metric_summary};

use crate::table::{Metric, ResultsTable};

/// Top-level summary document for one run session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Harness crate version
    pub harness_version: String,
    /// When the summary was produced
    pub timestamp: DateTime<Utc>,
    /// Solver executable that was benchmarked
    pub solver: String,
    /// Requested trials per level
    pub trials_per_level: u32,
    /// Per-level stats, in corpus order
    pub levels: Vec<LevelSummary>,
}

/// Stats for one level
#[derive(Debug, Clone, Serialize)]
pub struct LevelSummary {
    /// Level identifier
    pub level: String,
    /// Trials recorded for this level
    pub trials: usize,
    /// Trials that exited non-zero, died to a signal, or timed out
    pub failures: usize,
    /// Wall-time stats in seconds
    pub duration_secs: MetricStats,
    /// CPU-time stats in seconds, when sampling produced data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_time_secs: Option<MetricStats>,
    /// Peak-memory stats in MiB, when sampling produced data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_memory_mib: Option<MetricStats>,
}

/// Serializable location summary
#[derive(Debug, Clone, Serialize)]
pub struct MetricStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Smallest observation
    pub min: f64,
    /// Largest observation
    pub max: f64,
}

impl From<MetricSummary> for MetricStats {
    fn from(summary: MetricSummary) -> Self {
        Self {
            mean: summary.mean,
            median: summary.median,
            min: summary.min,
            max: summary.max,
        }
    }
}

/// Build the session summary from the full results table
pub fn build_session_summary(
    table: &ResultsTable,
    harness_version: &str,
    solver: &str,
    trials_per_level: u32,
) -> SessionSummary {
    let mut levels = Vec::new();

    for level in table.levels() {
        let durations = table.metric_values(level, Metric::Duration);
        let Some(duration_stats) = compute_metric_summary(&durations) else {
            continue;
        };

        let rows: Vec<_> = table.rows().iter().filter(|t| t.level == level).collect();
        let failures = rows
            .iter()
            .filter(|t| t.timed_out || t.exit_code != Some(0))
            .count();

        let cpu = compute_metric_summary(&table.metric_values(level, Metric::CpuTime));
        let memory = compute_metric_summary(&table.metric_values(level, Metric::PeakMemory));

        levels.push(LevelSummary {
            level: level.to_string(),
            trials: rows.len(),
            failures,
            duration_secs: duration_stats.into(),
            cpu_time_secs: cpu.map(MetricStats::from),
            peak_memory_mib: memory.map(MetricStats::from),
        });
    }

    SessionSummary {
        harness_version: harness_version.to_string(),
        timestamp: Utc::now(),
        solver: solver.to_string(),
        trials_per_level,
        levels,
    }
}

/// Serialize the summary as pretty JSON
pub fn generate_summary_json(summary: &SessionSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
