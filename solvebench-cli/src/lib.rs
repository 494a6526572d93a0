#![warn(missing_docs)]
//! Solvebench CLI
//!
//! Command-line front end for the solver benchmarking harness. Resolves
//! configuration (solvebench.toml defaults, CLI-flag overrides) into an
//! explicit [`HarnessOptions`] object, then hands it to
//! [`run_harness`].
//!
//! # Example
//!
//! ```text
//! solvebench --corpus levels --solver target/release/hexsolver -n 10
//! ```

mod config;
mod harness;
mod session;

pub use config::{CorpusConfig, HarnessConfig, OutputConfig, RunnerConfig, VisualsConfig};
pub use harness::{
    HarnessOptions, HarnessOutcome, RAW_TABLE_FILE, REDUCED_TABLE_FILE, SUMMARY_FILE, run_harness,
};
pub use session::RunSession;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use solvebench_core::load_corpus;

/// Solvebench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "solvebench")]
#[command(author, version, about = "Benchmark an external puzzle solver against a corpus of level files")]
pub struct Cli {
    /// Directory containing .txt level files
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Path to the solver executable
    #[arg(long)]
    pub solver: Option<PathBuf>,

    /// Number of trials per level
    #[arg(long, short = 'n')]
    pub trials: Option<u32>,

    /// Resource sampling interval (e.g. "100ms")
    #[arg(long)]
    pub poll_interval: Option<String>,

    /// Per-trial timeout (e.g. "30s"); a hung solver is killed and the
    /// trial recorded as timed out
    #[arg(long)]
    pub timeout: Option<String>,

    /// Level name to omit from the filtered combined plots
    #[arg(long)]
    pub exclude: Option<String>,

    /// Root directory for run-session output
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Explicit configuration file (defaults to discovering
    /// solvebench.toml upward from the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List the corpus and planned trial count without running the solver
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the solvebench CLI. This is the binary's entry point.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the CLI with pre-parsed arguments
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("solvebench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("solvebench=info")
            .init();
    }

    let config = match &cli.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HarnessConfig::discover().unwrap_or_default(),
    };

    let options = resolve_options(&cli, &config)?;

    if cli.dry_run {
        return list_corpus(&options);
    }

    let outcome = run_harness(&options)?;

    println!(
        "\n{} trials across {} levels, {} plots.",
        outcome.trials, outcome.levels, outcome.plots
    );
    println!("Session artifacts in: {}", outcome.session_dir.display());

    Ok(())
}

/// Layer CLI flags over config-file values into explicit harness options
pub fn resolve_options(cli: &Cli, config: &HarnessConfig) -> anyhow::Result<HarnessOptions> {
    let corpus_dir = cli
        .corpus
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.corpus.directory));

    let solver_path = cli
        .solver
        .clone()
        .or_else(|| config.runner.solver.as_ref().map(PathBuf::from))
        .context("no solver configured; pass --solver or set runner.solver in solvebench.toml")?;

    let poll_interval = HarnessConfig::parse_duration(
        cli.poll_interval
            .as_deref()
            .unwrap_or(&config.runner.poll_interval),
    )
    .context("invalid poll interval")?;

    let trial_timeout = cli
        .timeout
        .as_deref()
        .or(config.runner.timeout.as_deref())
        .map(HarnessConfig::parse_duration)
        .transpose()
        .context("invalid trial timeout")?;

    Ok(HarnessOptions {
        corpus_dir,
        solver_path,
        trials_per_level: cli.trials.unwrap_or(config.runner.trials).max(1),
        poll_interval,
        trial_timeout,
        exclusion_filter: cli.exclude.clone().or_else(|| config.runner.exclude.clone()),
        output_root: cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.directory)),
        plot_width: config.visuals.width,
        plot_height: config.visuals.height,
    })
}

fn list_corpus(options: &HarnessOptions) -> anyhow::Result<()> {
    let levels = load_corpus(&options.corpus_dir)?;

    println!("Solvebench plan:");
    for level in &levels {
        println!("├── {} ({} bytes)", level.name, level.text.len());
    }
    println!(
        "{} levels, {} trials each, {} solver invocations.",
        levels.len(),
        options.trials_per_level,
        levels.len() as u64 * options.trials_per_level as u64
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cli_from(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("solvebench").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_flags_override_config() {
        let config: HarnessConfig = toml::from_str(
            r#"
            [runner]
            solver = "from_config"
            trials = 10
            poll_interval = "100ms"
            "#,
        )
        .unwrap();

        let cli = cli_from(&[
            "--solver",
            "from_flag",
            "-n",
            "3",
            "--poll-interval",
            "50ms",
            "--timeout",
            "2s",
        ]);
        let options = resolve_options(&cli, &config).unwrap();

        assert_eq!(options.solver_path, PathBuf::from("from_flag"));
        assert_eq!(options.trials_per_level, 3);
        assert_eq!(options.poll_interval, Duration::from_millis(50));
        assert_eq!(options.trial_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_config_supplies_defaults() {
        let config: HarnessConfig = toml::from_str(
            r#"
            [runner]
            solver = "bin/solver"
            exclude = "tutorial"
            "#,
        )
        .unwrap();

        let cli = cli_from(&[]);
        let options = resolve_options(&cli, &config).unwrap();

        assert_eq!(options.solver_path, PathBuf::from("bin/solver"));
        assert_eq!(options.trials_per_level, 10);
        assert_eq!(options.poll_interval, Duration::from_millis(100));
        assert_eq!(options.trial_timeout, None);
        assert_eq!(options.exclusion_filter.as_deref(), Some("tutorial"));
        assert_eq!(options.output_root, PathBuf::from("solver_runs"));
    }

    #[test]
    fn test_missing_solver_is_an_error() {
        let cli = cli_from(&[]);
        let err = resolve_options(&cli, &HarnessConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no solver configured"));
    }

    #[test]
    fn test_zero_trials_clamped_to_one() {
        let cli = cli_from(&["--solver", "s", "-n", "0"]);
        let options = resolve_options(&cli, &HarnessConfig::default()).unwrap();
        assert_eq!(options.trials_per_level, 1);
    }
}
