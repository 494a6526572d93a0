//! Results Table
//!
//! The single ordered table every trial lands in, and the `Metric`
//! enumeration used to slice it for plotting. Rows stay in trial order:
//! all trials of the first level, then the second, each with run indices
//! 1..=N.

use std::time::Duration;

use solvebench_core::Trial;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// One measured quantity per trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Wall-clock duration (always present)
    Duration,
    /// Cumulative CPU time (present when sampling succeeded)
    CpuTime,
    /// Peak resident memory (present when sampling succeeded)
    PeakMemory,
}

impl Metric {
    /// All metrics, in rendering order
    pub const ALL: [Metric; 3] = [Metric::Duration, Metric::CpuTime, Metric::PeakMemory];

    /// Identifier used in artifact file names
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Duration => "duration",
            Metric::CpuTime => "cpu_time",
            Metric::PeakMemory => "peak_memory",
        }
    }

    /// Human-readable name for plot titles
    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Duration => "Wall time",
            Metric::CpuTime => "CPU time",
            Metric::PeakMemory => "Peak memory",
        }
    }

    /// Axis label for plots
    pub fn axis_label(&self) -> &'static str {
        match self {
            Metric::Duration => "Wall time (seconds)",
            Metric::CpuTime => "CPU time (seconds)",
            Metric::PeakMemory => "Peak memory (MiB)",
        }
    }

    /// The trial's value for this metric in plot units (seconds for the
    /// time metrics, MiB for memory), or `None` when it was not sampled
    pub fn value(&self, trial: &Trial) -> Option<f64> {
        match self {
            Metric::Duration => Some(trial.duration.as_secs_f64()),
            Metric::CpuTime => trial.cpu_time.map(|d: Duration| d.as_secs_f64()),
            Metric::PeakMemory => trial
                .peak_memory_bytes
                .map(|bytes| bytes as f64 / BYTES_PER_MIB),
        }
    }
}

/// Ordered collection of every trial in a run session
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    rows: Vec<Trial>,
}

impl ResultsTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished trial
    pub fn push(&mut self, trial: Trial) {
        self.rows.push(trial);
    }

    /// All rows in trial order
    pub fn rows(&self) -> &[Trial] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no trials
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Level names in first-seen order
    pub fn levels(&self) -> Vec<&str> {
        let mut levels: Vec<&str> = Vec::new();
        for trial in &self.rows {
            if !levels.contains(&trial.level.as_str()) {
                levels.push(&trial.level);
            }
        }
        levels
    }

    /// Non-missing values of one metric for one level, in trial order
    pub fn metric_values(&self, level: &str, metric: Metric) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|trial| trial.level == level)
            .filter_map(|trial| metric.value(trial))
            .collect()
    }

    /// Rows where every metric is present and the trial completed —
    /// the input for tooling that cannot tolerate missing values
    pub fn complete_cases(&self) -> ResultsTable {
        ResultsTable {
            rows: self
                .rows
                .iter()
                .filter(|trial| trial.is_complete_case())
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(level: &str, run: u32, with_metrics: bool) -> Trial {
        Trial {
            level: level.to_string(),
            run,
            duration: Duration::from_millis(100 + run as u64),
            cpu_time: with_metrics.then(|| Duration::from_millis(80)),
            peak_memory_bytes: with_metrics.then_some(10 * 1024 * 1024),
            exit_code: Some(0),
            timed_out: false,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_levels_first_seen_order() {
        let mut table = ResultsTable::new();
        table.push(trial("b_level", 1, true));
        table.push(trial("b_level", 2, true));
        table.push(trial("a_level", 1, true));

        assert_eq!(table.levels(), vec!["b_level", "a_level"]);
    }

    #[test]
    fn test_metric_values_skip_missing() {
        let mut table = ResultsTable::new();
        table.push(trial("x", 1, true));
        table.push(trial("x", 2, false));
        table.push(trial("x", 3, true));

        assert_eq!(table.metric_values("x", Metric::Duration).len(), 3);
        assert_eq!(table.metric_values("x", Metric::CpuTime).len(), 2);
        assert_eq!(table.metric_values("x", Metric::PeakMemory).len(), 2);
    }

    #[test]
    fn test_memory_values_in_mib() {
        let mut table = ResultsTable::new();
        table.push(trial("x", 1, true));

        let values = table.metric_values("x", Metric::PeakMemory);
        assert!((values[0] - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_complete_cases_filter() {
        let mut table = ResultsTable::new();
        table.push(trial("x", 1, true));
        table.push(trial("x", 2, false));
        let mut timed_out = trial("x", 3, true);
        timed_out.timed_out = true;
        table.push(timed_out);

        let complete = table.complete_cases();
        assert_eq!(complete.len(), 1);
        assert_eq!(complete.rows()[0].run, 1);
    }
}
