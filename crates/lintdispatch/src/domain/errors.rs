//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions that abort a run with exit code 1.
///
/// Lint findings are not errors; they are reported as warnings and folded into a
/// [`Verdict`](crate::domain::model::Verdict).
#[derive(Debug, Error)]
pub enum LintError {
    #[error("target patch directory \"{}\" does not exist", .path.display())]
    MissingTargetDir { path: PathBuf },

    #[error(".patches file \"{}\" does not exist", .path.display())]
    MissingManifest { path: PathBuf },

    #[error("'{entry}' is listed in {} more than once", .manifest.display())]
    DuplicateManifestEntry { entry: String, manifest: PathBuf },

    #[error("malformed patch config {}", .path.display())]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to find changed files: {0}")]
    ChangeSet(String),

    #[error("failed to run {tool}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LintError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
