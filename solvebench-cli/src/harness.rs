//! Harness Orchestration
//!
//! Drives the whole pipeline for one run session: load the corpus, run
//! the level × trial double loop strictly sequentially (concurrent
//! solver invocations would contend for CPU and corrupt the timing
//! comparison), then persist tables, plots, and the session summary.
//!
//! Setup failures (missing corpus, empty corpus, missing solver,
//! unwritable output root) abort before any trial runs. Everything that
//! goes wrong after that is absorbed into the data: failed solves,
//! timeouts, and missing resource samples are rows, not errors.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use solvebench_core::{TrialConfig, TrialRunner, load_corpus};
use solvebench_report::{
    Metric, PlotOptions, ResultsTable, build_session_summary, generate_summary_json,
    render_box_plot, write_table,
};
use solvebench_stats::{BoxStats, compute_box_stats};

use crate::session::RunSession;

/// File name of the raw results table
pub const RAW_TABLE_FILE: &str = "solver_times.csv";
/// File name of the complete-case table
pub const REDUCED_TABLE_FILE: &str = "boxplot_data.csv";
/// File name of the JSON session summary
pub const SUMMARY_FILE: &str = "summary.json";

/// Fully resolved harness options, passed in explicitly at startup
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    /// Directory of `.txt` level files
    pub corpus_dir: PathBuf,
    /// Solver executable to benchmark
    pub solver_path: PathBuf,
    /// Trials per level
    pub trials_per_level: u32,
    /// Resource sampling interval
    pub poll_interval: Duration,
    /// Per-trial deadline; `None` waits indefinitely
    pub trial_timeout: Option<Duration>,
    /// Level name to omit from the filtered combined plots
    pub exclusion_filter: Option<String>,
    /// Root directory receiving session directories
    pub output_root: PathBuf,
    /// Width of a per-level plot in pixels
    pub plot_width: u32,
    /// Height of every plot in pixels
    pub plot_height: u32,
}

/// What a completed run produced
#[derive(Debug)]
pub struct HarnessOutcome {
    /// The session directory holding every artifact
    pub session_dir: PathBuf,
    /// Levels benchmarked
    pub levels: usize,
    /// Total trial rows recorded
    pub trials: usize,
    /// Plot files written
    pub plots: usize,
}

/// Run the complete harness pipeline
pub fn run_harness(options: &HarnessOptions) -> anyhow::Result<HarnessOutcome> {
    let levels = load_corpus(&options.corpus_dir)?;

    let runner = TrialRunner::new(TrialConfig {
        solver_path: options.solver_path.clone(),
        trials_per_level: options.trials_per_level,
        poll_interval: options.poll_interval,
        trial_timeout: options.trial_timeout,
    });
    runner.validate_solver()?;

    let session = RunSession::create(&options.output_root)?;
    tracing::info!(
        session = %session.label,
        levels = levels.len(),
        trials_per_level = options.trials_per_level,
        solver = %options.solver_path.display(),
        "starting run session"
    );

    let total = levels.len() as u64 * options.trials_per_level as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut table = ResultsTable::new();
    for level in &levels {
        tracing::info!(level = %level.name, "running level");
        for run in 1..=options.trials_per_level {
            pb.set_message(format!("{} #{run}", level.name));
            let trial = runner.run_trial(level, run)?;
            tracing::info!(
                level = %level.name,
                run,
                duration_secs = trial.duration.as_secs_f64(),
                "trial recorded"
            );
            table.push(trial);
            pb.inc(1);
        }
    }
    pb.finish_with_message("trials complete");

    let plots = write_artifacts(&table, &session, options)?;

    Ok(HarnessOutcome {
        session_dir: session.dir,
        levels: levels.len(),
        trials: table.len(),
        plots,
    })
}

struct PlotJob {
    file_name: String,
    groups: Vec<(String, BoxStats)>,
    options: PlotOptions,
}

fn write_artifacts(
    table: &ResultsTable,
    session: &RunSession,
    options: &HarnessOptions,
) -> anyhow::Result<usize> {
    let raw_path = session.dir.join(RAW_TABLE_FILE);
    write_table(table, &raw_path)?;
    tracing::info!(path = %raw_path.display(), rows = table.len(), "wrote raw results table");

    let reduced = table.complete_cases();
    let reduced_path = session.dir.join(REDUCED_TABLE_FILE);
    write_table(&reduced, &reduced_path)?;
    tracing::info!(
        path = %reduced_path.display(),
        rows = reduced.len(),
        "wrote complete-case table"
    );

    let jobs = plan_plots(table, options);

    // Rendering is pure string building, so the figure set parallelizes
    // freely; writes stay sequential.
    let rendered: Vec<(String, String)> = jobs
        .into_par_iter()
        .map(|job| {
            let svg = render_box_plot(&job.groups, &job.options);
            (job.file_name, svg)
        })
        .collect();

    for (file_name, svg) in &rendered {
        let path = session.dir.join(file_name);
        fs::write(&path, svg)
            .with_context(|| format!("failed to write plot {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote plot");
    }

    let summary = build_session_summary(
        table,
        env!("CARGO_PKG_VERSION"),
        &options.solver_path.display().to_string(),
        options.trials_per_level,
    );
    let summary_path = session.dir.join(SUMMARY_FILE);
    fs::write(&summary_path, generate_summary_json(&summary)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    Ok(rendered.len())
}

/// Decide which figures to render. Pairs with zero valid observations
/// are skipped with a notice; that is expected for CPU/memory whenever
/// the solver finishes faster than the sampler can observe it.
fn plan_plots(table: &ResultsTable, options: &HarnessOptions) -> Vec<PlotJob> {
    let levels = table.levels();
    let mut jobs = Vec::new();

    for metric in Metric::ALL {
        let mut combined: Vec<(String, BoxStats)> = Vec::new();

        for level in &levels {
            let values = table.metric_values(level, metric);
            let Some(stats) = compute_box_stats(&values) else {
                tracing::info!(
                    level = %level,
                    metric = metric.name(),
                    "no valid samples, skipping plot"
                );
                continue;
            };

            jobs.push(PlotJob {
                file_name: format!("{level}_{}.svg", metric.name()),
                groups: vec![(level.to_string(), stats.clone())],
                options: PlotOptions {
                    width: options.plot_width,
                    height: options.plot_height,
                    title: format!("{} for {level}", metric.display_name()),
                    value_label: metric.axis_label().to_string(),
                },
            });
            combined.push((level.to_string(), stats));
        }

        if combined.is_empty() {
            tracing::info!(metric = metric.name(), "no level has samples, skipping combined plot");
            continue;
        }

        let combined_options = PlotOptions {
            width: options.plot_width * 2,
            height: options.plot_height * 3 / 2,
            title: format!(
                "{} per level ({} trials each)",
                metric.display_name(),
                options.trials_per_level
            ),
            value_label: metric.axis_label().to_string(),
        };

        if let Some(excluded) = options.exclusion_filter.as_deref() {
            let filtered: Vec<(String, BoxStats)> = combined
                .iter()
                .filter(|(level, _)| level != excluded)
                .cloned()
                .collect();

            if filtered.is_empty() {
                tracing::info!(
                    metric = metric.name(),
                    excluded,
                    "exclusion filter leaves no levels, skipping filtered plot"
                );
            } else {
                jobs.push(PlotJob {
                    file_name: format!("all_levels_{}_filtered.svg", metric.name()),
                    groups: filtered,
                    options: PlotOptions {
                        title: format!("{} (excluding {excluded})", combined_options.title),
                        ..combined_options.clone()
                    },
                });
            }
        }

        jobs.push(PlotJob {
            file_name: format!("all_levels_{}.svg", metric.name()),
            groups: combined,
            options: combined_options,
        });
    }

    jobs
}
