#![warn(missing_docs)]
//! Solvebench Report - Aggregation and Visualization
//!
//! Turns trial records into session artifacts:
//! - `ResultsTable`: the flat, ordered table of every trial
//! - CSV persistence (raw table and complete-case table) with a parser
//!   for round-trip verification
//! - SVG box plots, per (level, metric) and combined across levels
//! - A machine-readable JSON session summary

mod csv;
mod summary;
mod svg;
mod table;

use std::path::PathBuf;

use thiserror::Error;

pub use csv::{CsvDocument, RAW_TABLE_COLUMNS, parse_csv, table_to_csv, write_table};
pub use summary::{
    LevelSummary, MetricStats, SessionSummary, build_session_summary, generate_summary_json,
};
pub use svg::{PlotOptions, render_box_plot};
pub use table::{Metric, ResultsTable};

/// Errors surfaced while persisting or parsing session artifacts
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing an artifact file failed
    #[error("failed to write {}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed
    #[error("malformed csv: {0}")]
    MalformedCsv(String),
}
