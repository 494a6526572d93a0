//! Trial Execution
//!
//! Runs the external solver once per trial: spawn `<solver> -`, feed the
//! level text to stdin, drain stdout/stderr on reader threads, sample
//! resource usage concurrently, and await termination. Wall-clock time
//! is taken around the entire process lifetime — the timer starts before
//! spawn and stops only once the child is confirmed terminated, so
//! process-creation overhead is part of the measurement.
//!
//! Failure policy: a spawn failure (missing executable, permission
//! denied) is fatal for the whole harness. A solver that exits non-zero,
//! writes to stderr, or dies to a signal is *data* — the trial records
//! it and the harness moves on.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::corpus::Level;
use crate::sampler::SamplerHandle;

/// Argument telling the solver to read the puzzle from stdin
pub const STDIN_SENTINEL: &str = "-";

/// How often the timeout path re-checks for child exit
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Errors that abort the harness (setup-class failures)
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The solver executable does not exist
    #[error("solver executable not found: {}", .0.display())]
    SolverMissing(PathBuf),

    /// The solver process could not be launched
    #[error("failed to launch solver {}", .path.display())]
    Spawn {
        /// Executable that failed to start
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: io::Error,
    },

    /// Waiting on the solver process failed
    #[error("failed to await solver process")]
    Wait(#[source] io::Error),
}

/// Execution parameters for the trial loop
#[derive(Debug, Clone)]
pub struct TrialConfig {
    /// Path to the solver executable
    pub solver_path: PathBuf,
    /// Trials to run per level
    pub trials_per_level: u32,
    /// Resource sampling interval
    pub poll_interval: Duration,
    /// Per-trial deadline; `None` waits indefinitely
    pub trial_timeout: Option<Duration>,
}

/// One timed, sampled execution of the solver against one level
#[derive(Debug, Clone)]
pub struct Trial {
    /// Level identifier
    pub level: String,
    /// 1-based trial index within the level
    pub run: u32,
    /// Wall-clock time around the whole process lifetime
    pub duration: Duration,
    /// Cumulative CPU time, if sampled
    pub cpu_time: Option<Duration>,
    /// Peak resident memory in bytes, if sampled
    pub peak_memory_bytes: Option<u64>,
    /// Process exit code; negative values are `-signal` for
    /// signal-terminated children
    pub exit_code: Option<i32>,
    /// Whether the harness killed the child at the trial deadline
    pub timed_out: bool,
    /// Captured stdout, lossily decoded, trailing whitespace trimmed
    pub stdout: String,
    /// Captured stderr, lossily decoded, trailing whitespace trimmed
    pub stderr: String,
}

impl Trial {
    /// Whether every optional metric is present and the trial completed
    pub fn is_complete_case(&self) -> bool {
        !self.timed_out && self.cpu_time.is_some() && self.peak_memory_bytes.is_some()
    }
}

/// Runs the solver repeatedly and produces `Trial` records
pub struct TrialRunner {
    config: TrialConfig,
}

impl TrialRunner {
    /// Create a runner for the given configuration
    pub fn new(config: TrialConfig) -> Self {
        Self { config }
    }

    /// Check the solver path up front so the harness can fail fast
    /// before creating any session artifacts
    pub fn validate_solver(&self) -> Result<(), RunnerError> {
        if self.config.solver_path.is_file() {
            Ok(())
        } else {
            Err(RunnerError::SolverMissing(self.config.solver_path.clone()))
        }
    }

    /// Run the configured number of trials against one level, in order
    pub fn run_level(&self, level: &Level) -> Result<Vec<Trial>, RunnerError> {
        let mut trials = Vec::with_capacity(self.config.trials_per_level as usize);
        for run in 1..=self.config.trials_per_level {
            trials.push(self.run_trial(level, run)?);
        }
        Ok(trials)
    }

    /// Run a single trial
    pub fn run_trial(&self, level: &Level, run: u32) -> Result<Trial, RunnerError> {
        let start = Instant::now();

        let mut command = Command::new(&self.config.solver_path);
        command
            .arg(STDIN_SENTINEL)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timed-out solver can be killed along
        // with any children it spawned (which would otherwise keep the
        // output pipes open past the kill).
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
            path: self.config.solver_path.clone(),
            source,
        })?;

        let sampler = SamplerHandle::spawn(child.id(), self.config.poll_interval);

        // Drain both output pipes on their own threads so a chatty solver
        // cannot fill a pipe buffer while we are still writing its input.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        self.feed_stdin(&mut child, level);

        let (status, timed_out) = self.await_exit(&mut child)?;
        let duration = start.elapsed();

        let stdout = join_capture(stdout_reader);
        let stderr = join_capture(stderr_reader);
        let usage = sampler.finish();

        let trial = Trial {
            level: level.name.clone(),
            run,
            duration,
            cpu_time: usage.cpu_time,
            peak_memory_bytes: usage.peak_memory_bytes,
            exit_code: exit_code_of(status),
            timed_out,
            stdout,
            stderr,
        };

        tracing::debug!(
            level = %trial.level,
            run = trial.run,
            duration_ms = trial.duration.as_millis() as u64,
            exit_code = ?trial.exit_code,
            timed_out = trial.timed_out,
            "trial finished"
        );

        Ok(trial)
    }

    /// Write the level text to the child's stdin, then close it.
    ///
    /// A solver that exits without consuming its input closes the pipe;
    /// the resulting broken-pipe error is end-of-conversation, not a
    /// harness failure — the child's exit status tells the real story.
    fn feed_stdin(&self, child: &mut Child, level: &Level) {
        let Some(mut stdin) = child.stdin.take() else {
            return;
        };

        if let Err(e) = stdin.write_all(level.text.as_bytes()) {
            if e.kind() != io::ErrorKind::BrokenPipe {
                tracing::warn!(level = %level.name, error = %e, "failed writing solver stdin");
            }
        }
        // stdin drops here, signaling end-of-input
    }

    /// Block until the child exits, enforcing the trial deadline if one
    /// is configured. Returns the exit status and whether the harness
    /// had to kill the child.
    fn await_exit(&self, child: &mut Child) -> Result<(ExitStatus, bool), RunnerError> {
        let Some(timeout) = self.config.trial_timeout else {
            let status = child.wait().map_err(RunnerError::Wait)?;
            return Ok((status, false));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(RunnerError::Wait)? {
                return Ok((status, false));
            }

            if Instant::now() >= deadline {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "trial deadline reached, killing solver"
                );
                kill_process_group(child.id());
                let _ = child.kill();
                let status = child.wait().map_err(RunnerError::Wait)?;
                return Ok((status, true));
            }

            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

/// Read a pipe to EOF on a dedicated thread, capturing what arrives
fn spawn_pipe_reader<R>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut captured = Vec::new();
        if let Some(mut pipe) = pipe {
            // A read error mid-stream leaves whatever was captured so far
            let _ = pipe.read_to_end(&mut captured);
        }
        captured
    })
}

fn join_capture(handle: thread::JoinHandle<Vec<u8>>) -> String {
    let bytes = handle.join().unwrap_or_default();
    String::from_utf8_lossy(&bytes).trim_end().to_string()
}

/// Exit code with the pack-wide signal convention: a child terminated by
/// signal N reports `-N`
fn exit_code_of(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(-signal);
        }
    }
    status.code()
}

/// SIGKILL the child's whole process group (unix only; no-op elsewhere)
fn kill_process_group(pid: u32) {
    #[cfg(unix)]
    {
        // SAFETY: kill with a negated pid targets the process group; it
        // touches no memory and any failure is reported via errno only.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn config(solver_path: PathBuf) -> TrialConfig {
        TrialConfig {
            solver_path,
            trials_per_level: 3,
            poll_interval: Duration::from_millis(10),
            trial_timeout: None,
        }
    }

    fn level(name: &str, text: &str) -> Level {
        Level {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_echo_solver_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let solver = write_script(dir.path(), "echo.sh", "cat");
        let runner = TrialRunner::new(config(solver));

        let trial = runner.run_trial(&level("easy", "hello puzzle"), 1).unwrap();

        assert_eq!(trial.level, "easy");
        assert_eq!(trial.run, 1);
        assert_eq!(trial.exit_code, Some(0));
        assert_eq!(trial.stdout, "hello puzzle");
        assert_eq!(trial.stderr, "");
        assert!(!trial.timed_out);
        assert!(trial.duration > Duration::ZERO);
    }

    #[test]
    fn test_run_level_yields_sequential_indices() {
        let dir = tempfile::tempdir().unwrap();
        let solver = write_script(dir.path(), "ok.sh", "exit 0");
        let runner = TrialRunner::new(config(solver));

        let trials = runner.run_level(&level("easy", "x")).unwrap();

        assert_eq!(trials.len(), 3);
        let runs: Vec<u32> = trials.iter().map(|t| t.run).collect();
        assert_eq!(runs, vec![1, 2, 3]);
    }

    #[test]
    fn test_nonzero_exit_is_data_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let solver = write_script(dir.path(), "fail.sh", "echo unsolvable >&2\nexit 3");
        let runner = TrialRunner::new(config(solver));

        let trial = runner.run_trial(&level("hard", "x"), 1).unwrap();

        assert_eq!(trial.exit_code, Some(3));
        assert_eq!(trial.stderr, "unsolvable");
    }

    #[test]
    fn test_signal_death_records_negative_code() {
        let dir = tempfile::tempdir().unwrap();
        let solver = write_script(dir.path(), "crash.sh", "kill -9 $$");
        let runner = TrialRunner::new(config(solver));

        let trial = runner.run_trial(&level("crashy", "x"), 1).unwrap();

        assert_eq!(trial.exit_code, Some(-9));
        assert!(!trial.timed_out);
    }

    #[test]
    fn test_fast_exit_leaves_metrics_missing_not_zero() {
        let dir = tempfile::tempdir().unwrap();
        let solver = write_script(dir.path(), "instant.sh", "exit 0");
        // Poll far slower than the process lives
        let mut cfg = config(solver);
        cfg.poll_interval = Duration::from_secs(5);
        let runner = TrialRunner::new(cfg);

        let trial = runner.run_trial(&level("instant", "x"), 1).unwrap();

        assert!(trial.duration > Duration::ZERO);
        // Either the single immediate sample landed or both are absent;
        // never a present-but-zero pair fabricated from a failed read.
        assert_eq!(trial.cpu_time.is_some(), trial.peak_memory_bytes.is_some());
    }

    #[test]
    fn test_timeout_kills_hung_solver() {
        let dir = tempfile::tempdir().unwrap();
        let solver = write_script(dir.path(), "hang.sh", "sleep 30");
        let mut cfg = config(solver);
        cfg.trial_timeout = Some(Duration::from_millis(200));
        let runner = TrialRunner::new(cfg);

        let start = Instant::now();
        let trial = runner.run_trial(&level("hung", "x"), 1).unwrap();

        assert!(trial.timed_out);
        assert_eq!(trial.exit_code, Some(-9));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_solver_is_fatal() {
        let runner = TrialRunner::new(config(PathBuf::from("/nonexistent/solver")));

        assert!(matches!(
            runner.validate_solver(),
            Err(RunnerError::SolverMissing(_))
        ));
        assert!(matches!(
            runner.run_trial(&level("easy", "x"), 1),
            Err(RunnerError::Spawn { .. })
        ));
    }

    #[test]
    fn test_large_input_does_not_deadlock() {
        let dir = tempfile::tempdir().unwrap();
        // Echoes everything back while we are still writing input
        let solver = write_script(dir.path(), "big.sh", "cat");
        let runner = TrialRunner::new(config(solver));

        let big = "x".repeat(1 << 20);
        let trial = runner.run_trial(&level("big", &big), 1).unwrap();

        assert_eq!(trial.exit_code, Some(0));
        assert_eq!(trial.stdout.len(), big.len());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_long_trial_samples_resources() {
        let dir = tempfile::tempdir().unwrap();
        let solver = write_script(dir.path(), "slow.sh", "sleep 0.4");
        let mut cfg = config(solver);
        cfg.poll_interval = Duration::from_millis(20);
        let runner = TrialRunner::new(cfg);

        let trial = runner.run_trial(&level("slow", "x"), 1).unwrap();

        assert!(trial.peak_memory_bytes.is_some());
        assert!(trial.cpu_time.is_some());
        assert!(trial.is_complete_case());
    }
}
