use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The scan root is missing, not a directory, or unreadable. Fatal —
    /// raised before any traversal begins.
    #[error("invalid root path {path}: {source}")]
    InvalidRoot { path: PathBuf, source: io::Error },

    /// Persisted report is unreadable, unparseable, or carries a schema
    /// version this build does not recognize.
    #[error("corrupt report {path}: {reason}")]
    CorruptReport { path: PathBuf, reason: String },

    /// A decision referenced an unknown group or a path outside the group's
    /// membership. The stored report is left unchanged.
    #[error("invalid decision: {0}")]
    InvalidDecision(String),

    /// Report save failed (disk full, permission). The previous valid report
    /// on disk is intact because writes are staged and renamed.
    #[error("failed to write report {path}: {source}")]
    ReportWrite { path: PathBuf, source: io::Error },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
