//! Snapshot load error types.

use std::path::PathBuf;

/// Errors that can occur when loading a snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The source file is missing or could not be read
    #[error("unreadable snapshot file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but failed structural validation
    #[error("malformed snapshot file {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
}

impl LoadError {
    /// The path of the file the load attempt was reading.
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Unreadable { path, .. } => path,
            LoadError::Malformed { path, .. } => path,
        }
    }
}
