//! Precondition errors raised before a trace starts.
//!
//! Nothing that happens *during* a trace is an error: misses, broken
//! re-export chains and cycles are recorded in the tree instead.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("origin set is empty: at least one origin directory is required")]
    EmptyOriginSet,
    #[error("no language extractor registered for {}", .path.display())]
    UnsupportedFile { path: PathBuf },
    #[error("unknown file type '{ext}'")]
    UnknownFileType { ext: String },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}
