//! Top-level error taxonomy with one documented exit code per kind.

use thiserror::Error;

use crate::index::IndexError;

/// Everything that can end a run early. `main` maps each variant to its
/// process exit code; nothing below `main` terminates the process.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Neither a package argument nor a requirements list was given.
    #[error("provide a package or a requirements list")]
    MissingInput,

    /// The same package was given both on the command line and in the
    /// requirements file.
    #[error("package {0} is already in the requirements list")]
    DuplicatePackage(String),

    /// An index URL was given without an http or https scheme.
    #[error("{0} has no http or https scheme")]
    MissingScheme(String),

    /// The eager reachability probe of a configured index failed.
    #[error("{url} is not reachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// One or more requested packages have no satisfying version on the
    /// origin. Detected before any transfer begins.
    #[error("some packages could not be synchronized: {}", .0.join(", "))]
    ResolutionShortfall(Vec<String>),

    /// An index query failed mid-run (after the reachability probe passed).
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Anything else: requirements parsing, login, download or upload
    /// failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Process exit code for this error, as documented on the CLI help.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::ResolutionShortfall(_) | SyncError::Index(_) | SyncError::Other(_) => 1,
            SyncError::MissingInput => 2,
            SyncError::DuplicatePackage(_) => 3,
            SyncError::MissingScheme(_) => 4,
            SyncError::Unreachable { .. } => 5,
        }
    }
}
