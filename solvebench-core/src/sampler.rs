//! Concurrent Resource Sampling
//!
//! While a trial's solver process runs, a sampler thread polls OS process
//! accounting for the child's cumulative CPU time (user+system) and peak
//! resident memory. The thread owns its observations and hands a single
//! final snapshot back over a one-shot channel when the runner joins it,
//! so no record is ever shared mutably between the two threads.
//!
//! Platform support goes through the `ProcessMetricsReader` capability
//! trait. The Linux reader parses `/proc/<pid>/stat` (utime+stime) and
//! `/proc/<pid>/status` (`VmHWM:`, falling back to `VmRSS:` on kernels
//! that omit the high-water mark). Other platforms degrade gracefully:
//! every sample is reported unavailable and the affected metrics are
//! recorded as missing, never zero.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// One successful observation of a running process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    /// Cumulative CPU time, user plus system
    pub cpu_time: Duration,
    /// Peak resident memory in bytes
    pub peak_memory_bytes: u64,
}

/// Final resource verdict for one trial
///
/// CPU time and peak memory are observed together, so either both fields
/// are present or both are absent (the process exited before any sample
/// landed, or the platform has no reader).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    /// Last observed cumulative CPU time
    pub cpu_time: Option<Duration>,
    /// Last observed peak resident memory in bytes
    pub peak_memory_bytes: Option<u64>,
}

impl ResourceUsage {
    /// Both metrics unavailable
    pub fn missing() -> Self {
        Self::default()
    }

    /// Usage backed by an actual observation
    pub fn from_sample(sample: ResourceSample) -> Self {
        Self {
            cpu_time: Some(sample.cpu_time),
            peak_memory_bytes: Some(sample.peak_memory_bytes),
        }
    }

    /// Whether any observation landed
    pub fn is_missing(&self) -> bool {
        self.cpu_time.is_none()
    }
}

/// Capability interface over per-process OS accounting
///
/// One method, one optional result: `None` covers every transient
/// failure (process already gone, permission denied, unsupported
/// platform) so the sampler loop never has to distinguish them.
pub trait ProcessMetricsReader: Send {
    /// Read the process's cumulative CPU time and peak memory, if the OS
    /// will answer right now
    fn sample(&mut self, pid: u32) -> Option<ResourceSample>;
}

/// Reader for the current platform
///
/// Linux gets the procfs reader; everywhere else gets a stub whose
/// samples are always unavailable.
pub fn platform_reader() -> Box<dyn ProcessMetricsReader> {
    #[cfg(target_os = "linux")]
    {
        Box::new(ProcfsReader::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(UnsupportedReader)
    }
}

/// Handle to a running sampler thread
///
/// The runner calls [`SamplerHandle::finish`] exactly once, after the
/// child is confirmed terminated; this signals the thread, receives the
/// final snapshot, and joins, guaranteeing no sampler outlives its trial.
pub struct SamplerHandle {
    stop: mpsc::Sender<()>,
    snapshot: mpsc::Receiver<ResourceUsage>,
    thread: thread::JoinHandle<()>,
}

impl SamplerHandle {
    /// Spawn a sampler for `pid` using the platform's reader
    pub fn spawn(pid: u32, interval: Duration) -> Self {
        Self::spawn_with(platform_reader(), pid, interval)
    }

    /// Spawn a sampler with an explicit reader (used by tests)
    pub fn spawn_with(
        mut reader: Box<dyn ProcessMetricsReader>,
        pid: u32,
        interval: Duration,
    ) -> Self {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let (tx, snapshot) = mpsc::sync_channel(1);

        let thread = thread::spawn(move || {
            let mut last: Option<ResourceSample> = None;
            let mut failure_logged = false;
            let mut done = false;

            loop {
                match reader.sample(pid) {
                    Some(sample) => last = Some(sample),
                    None => {
                        if !done && !failure_logged {
                            tracing::debug!(pid, "resource sample unavailable");
                            failure_logged = true;
                        }
                    }
                }

                if done {
                    break;
                }

                // The inter-poll sleep doubles as the stop signal wait,
                // so the runner's join never stalls for a full interval.
                // On stop, loop once more for a final best-effort sample.
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => done = true,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }

            let usage = last
                .map(ResourceUsage::from_sample)
                .unwrap_or_else(ResourceUsage::missing);
            let _ = tx.send(usage);
        });

        Self {
            stop,
            snapshot,
            thread,
        }
    }

    /// Signal process exit, collect the final snapshot, and join
    pub fn finish(self) -> ResourceUsage {
        let _ = self.stop.send(());
        let usage = self
            .snapshot
            .recv()
            .unwrap_or_else(|_| ResourceUsage::missing());
        let _ = self.thread.join();
        usage
    }
}

// ─── Linux reader ────────────────────────────────────────────────────────────

/// Procfs-backed reader for Linux
#[cfg(target_os = "linux")]
pub struct ProcfsReader {
    tick_hz: u64,
}

#[cfg(target_os = "linux")]
impl ProcfsReader {
    /// Create a reader, capturing the kernel's clock-tick rate once
    pub fn new() -> Self {
        Self {
            tick_hz: clock_tick_hz(),
        }
    }
}

#[cfg(target_os = "linux")]
impl Default for ProcfsReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
impl ProcessMetricsReader for ProcfsReader {
    fn sample(&mut self, pid: u32) -> Option<ResourceSample> {
        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
        let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;

        let cpu_time = parse_cpu_time(&stat, self.tick_hz)?;
        let peak_memory_bytes = parse_peak_memory(&status)?;

        Some(ResourceSample {
            cpu_time,
            peak_memory_bytes,
        })
    }
}

/// utime+stime converted to a `Duration`
///
/// The comm field (2) may contain spaces and parentheses, so fields are
/// counted from the last closing paren: state is field 3, utime and
/// stime are fields 14 and 15 of the full line, which lands them at
/// split indices 11 and 12 of the remainder.
#[cfg(target_os = "linux")]
fn parse_cpu_time(stat: &str, tick_hz: u64) -> Option<Duration> {
    let (_, rest) = stat.rsplit_once(')')?;
    let mut fields = rest.split_whitespace();

    let utime: u64 = fields.nth(11)?.parse().ok()?;
    let stime: u64 = fields.next()?.parse().ok()?;

    let ticks = utime + stime;
    Some(Duration::from_secs_f64(ticks as f64 / tick_hz as f64))
}

/// `VmHWM:` in bytes, falling back to `VmRSS:` when the high-water mark
/// line is absent
#[cfg(target_os = "linux")]
fn parse_peak_memory(status: &str) -> Option<u64> {
    let line = status
        .lines()
        .find(|l| l.starts_with("VmHWM:"))
        .or_else(|| status.lines().find(|l| l.starts_with("VmRSS:")))?;

    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(target_os = "linux")]
fn clock_tick_hz() -> u64 {
    // SAFETY: sysconf takes no pointers and has no preconditions.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 { ticks as u64 } else { 100 }
}

// ─── Fallback reader ─────────────────────────────────────────────────────────

/// Stub reader for platforms without process accounting support
#[cfg(not(target_os = "linux"))]
pub struct UnsupportedReader;

#[cfg(not(target_os = "linux"))]
impl ProcessMetricsReader for UnsupportedReader {
    fn sample(&mut self, _pid: u32) -> Option<ResourceSample> {
        None
    }
}
