//! Run Sessions
//!
//! Every harness invocation gets its own timestamp-labeled directory
//! under the output root; all artifacts for the run land inside it.
//! Labels are second-resolution local time in a human-sortable format,
//! with a numeric suffix appended when two runs start inside the same
//! second — sessions never share a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;

/// One harness invocation's output directory
#[derive(Debug)]
pub struct RunSession {
    /// Timestamp-derived directory name
    pub label: String,
    /// Absolute or root-relative path to the session directory
    pub dir: PathBuf,
}

impl RunSession {
    /// Create a fresh session directory under `output_root`
    pub fn create(output_root: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(output_root).with_context(|| {
            format!("failed to create output root {}", output_root.display())
        })?;

        let base = Local::now().format("%Y%m%d-%H%M%S").to_string();

        for attempt in 0u32.. {
            let label = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}-{}", attempt + 1)
            };
            let dir = output_root.join(&label);

            match fs::create_dir(&dir) {
                Ok(()) => {
                    tracing::info!(session = %label, "created run session directory");
                    return Ok(Self { label, dir });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("failed to create session directory {}", dir.display())
                    });
                }
            }
        }
        unreachable!("session label suffixes are unbounded")
    }
}
