//! Corpus Loading
//!
//! A corpus is a directory of plain-text puzzle files, one `Level` per
//! `.txt` file. Levels are returned sorted lexicographically by file
//! name so trial order is deterministic across runs.
//!
//! An empty corpus is an error, not a warning: a run against zero levels
//! can produce no data, so the harness refuses to start.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File extension recognized as a puzzle input
pub const LEVEL_EXTENSION: &str = "txt";

/// Errors surfaced while loading the corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus directory does not exist or cannot be listed
    #[error("corpus directory not found: {}", .path.display())]
    DirectoryMissing {
        /// Directory that was requested
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// A level file could not be read
    #[error("failed to read level file {}", .path.display())]
    LevelUnreadable {
        /// File that failed
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// The directory exists but contains no `.txt` files
    #[error("no .{} level files in {}", LEVEL_EXTENSION, .0.display())]
    Empty(PathBuf),
}

/// One named puzzle input, immutable once loaded
#[derive(Debug, Clone)]
pub struct Level {
    /// Display/group identifier (the file stem)
    pub name: String,
    /// Raw puzzle text, fed verbatim to the solver's stdin
    pub text: String,
}

/// Load every `.txt` file in `dir` as a `Level`, sorted by file name
pub fn load_corpus(dir: &Path) -> Result<Vec<Level>, CorpusError> {
    let entries = fs::read_dir(dir).map_err(|source| CorpusError::DirectoryMissing {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == LEVEL_EXTENSION)
        })
        .collect();

    if paths.is_empty() {
        return Err(CorpusError::Empty(dir.to_path_buf()));
    }

    paths.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));

    let mut levels = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path).map_err(|source| CorpusError::LevelUnreadable {
            path: path.clone(),
            source,
        })?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(level = %name, bytes = text.len(), "loaded level");
        levels.push(Level { name, text });
    }

    Ok(levels)
}
