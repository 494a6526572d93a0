//! Configuration loading from solvebench.toml
//!
//! Harness configuration can be specified in a `solvebench.toml` file in
//! the project root, discovered by walking up from the current directory.
//! Every value has a default and every value can be overridden by a CLI
//! flag; the file only exists so a corpus/solver pairing can be pinned
//! per project.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HarnessConfig {
    /// Corpus configuration
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Trial-loop configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Plot dimensions
    #[serde(default)]
    pub visuals: VisualsConfig,
}

/// Corpus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory containing `.txt` level files
    #[serde(default = "default_corpus_dir")]
    pub directory: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            directory: default_corpus_dir(),
        }
    }
}

fn default_corpus_dir() -> String {
    "levels".to_string()
}

/// Trial-loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Path to the solver executable
    #[serde(default)]
    pub solver: Option<String>,
    /// Trials per level
    #[serde(default = "default_trials")]
    pub trials: u32,
    /// Resource sampling interval (e.g. "100ms")
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    /// Per-trial timeout (e.g. "30s"); absent means wait indefinitely
    #[serde(default)]
    pub timeout: Option<String>,
    /// Level name excluded from the filtered combined plots
    #[serde(default)]
    pub exclude: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            solver: None,
            trials: default_trials(),
            poll_interval: default_poll_interval(),
            timeout: None,
            exclude: None,
        }
    }
}

fn default_trials() -> u32 {
    10
}
fn default_poll_interval() -> String {
    "100ms".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run-session output
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "solver_runs".to_string()
}

/// Plot dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualsConfig {
    /// Width in pixels of a per-level plot (combined plots are doubled)
    #[serde(default = "default_width")]
    pub width: u32,
    /// Height in pixels of every plot
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for VisualsConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> u32 {
    600
}
fn default_height() -> u32 {
    400
}

impl HarnessConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from the
    /// current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("solvebench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Parse a duration string (e.g. "100ms", "2s", "1m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("empty duration string"));
        }

        // Find where the number ends and the unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid duration number: {}", num_part))?;
        if value < 0.0 {
            return Err(anyhow::anyhow!("negative duration: {}", s));
        }

        let nanos_per_unit: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * nanos_per_unit as f64) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.corpus.directory, "levels");
        assert_eq!(config.runner.trials, 10);
        assert_eq!(config.runner.poll_interval, "100ms");
        assert!(config.runner.timeout.is_none());
        assert_eq!(config.output.directory, "solver_runs");
    }

    #[test]
    fn test_parse_duration() {
        let parse = HarnessConfig::parse_duration;
        assert_eq!(parse("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse("3").unwrap(), Duration::from_secs(3));

        assert!(parse("").is_err());
        assert!(parse("fast").is_err());
        assert!(parse("10fortnights").is_err());
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let toml_str = r#"
            [runner]
            solver = "target/release/hexsolver"
            trials = 5

            [corpus]
            directory = "puzzles"
        "#;

        let config: HarnessConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.solver.as_deref(), Some("target/release/hexsolver"));
        assert_eq!(config.runner.trials, 5);
        assert_eq!(config.corpus.directory, "puzzles");
        // Defaults still apply to everything unspecified
        assert_eq!(config.runner.poll_interval, "100ms");
        assert_eq!(config.output.directory, "solver_runs");
        assert_eq!(config.visuals.width, 600);
    }
}
