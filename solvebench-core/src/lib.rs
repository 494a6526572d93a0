#![warn(missing_docs)]
//! Solvebench Core - Measurement Harness
//!
//! This crate provides the measurement side of the harness:
//! - Corpus loading (one `Level` per `.txt` puzzle file)
//! - Trial execution against an external solver process
//! - Concurrent resource sampling of the running solver
//!
//! The solver is a black box: it receives one puzzle on stdin (signaled
//! by a single `-` argument) and answers on stdout. One trial is one
//! spawn/feed/await cycle, timed wall-clock around the whole process
//! lifetime, with a sampler thread polling CPU time and peak memory
//! while the child runs.

mod corpus;
mod runner;
mod sampler;

pub use corpus::{CorpusError, LEVEL_EXTENSION, Level, load_corpus};
pub use runner::{RunnerError, STDIN_SENTINEL, Trial, TrialConfig, TrialRunner};
pub use sampler::{
    ProcessMetricsReader, ResourceSample, ResourceUsage, SamplerHandle, platform_reader,
};
