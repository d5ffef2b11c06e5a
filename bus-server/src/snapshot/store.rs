//! Snapshot store.
//!
//! Holds the active [`Snapshot`] behind a read-write lock and swaps it
//! atomically. Readers clone an `Arc` handle and keep querying the dataset
//! they got even while a replacement lands; a failed load never disturbs the
//! active snapshot.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::error::LoadError;
use super::file::SnapshotFile;
use super::model::Snapshot;

/// Where the store reads snapshot data from.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Most recently installed replacement dataset. Checked first.
    pub primary_path: PathBuf,

    /// Dataset shipped alongside the binary, used when no replacement is
    /// installed or the installed one does not load.
    pub bundled_path: PathBuf,
}

impl StoreConfig {
    pub fn new(primary_path: impl Into<PathBuf>, bundled_path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            primary_path: primary_path.into(),
            bundled_path: bundled_path.into(),
        }
    }
}

/// Thread-safe holder of the active snapshot.
#[derive(Debug)]
pub struct SnapshotStore {
    inner: RwLock<Arc<Snapshot>>,
    config: StoreConfig,
}

impl SnapshotStore {
    /// Open the store, loading the primary dataset and falling back to the
    /// bundled one.
    ///
    /// Both sources failing is the only unrecoverable case; the error of the
    /// final (bundled) attempt is returned.
    pub fn open(config: StoreConfig) -> Result<Self, LoadError> {
        let snapshot = match Self::load_file(&config.primary_path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if is_missing_file(&e) {
                    debug!(path = %config.primary_path.display(), "no installed snapshot, using bundled dataset");
                } else {
                    warn!(error = %e, "installed snapshot unusable, using bundled dataset");
                }
                Self::load_file(&config.bundled_path)?
            }
        };

        info!(
            version = snapshot.version,
            routes = snapshot.routes.len(),
            stops = snapshot.stops.len(),
            "loaded snapshot"
        );

        Ok(SnapshotStore {
            inner: RwLock::new(Arc::new(snapshot)),
            config,
        })
    }

    /// Read and validate one snapshot file.
    pub fn load_file(path: &Path) -> Result<Snapshot, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SnapshotFile =
            serde_json::from_slice(&bytes).map_err(|e| LoadError::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Snapshot::from_file(file))
    }

    /// Load the primary dataset without touching the active snapshot.
    pub fn load_primary(&self) -> Result<Snapshot, LoadError> {
        Self::load_file(&self.config.primary_path)
    }

    /// The active snapshot. Cheap; clones an `Arc`.
    pub fn current(&self) -> Arc<Snapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Version of the active snapshot.
    pub fn version(&self) -> i64 {
        self.current().version
    }

    /// Swap the active snapshot for a new one, returning the new handle.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            old_version = guard.version,
            new_version = next.version,
            "replaced snapshot"
        );
        *guard = next.clone();
        next
    }
}

fn is_missing_file(e: &LoadError) -> bool {
    matches!(
        e,
        LoadError::Unreadable { source, .. } if source.kind() == ErrorKind::NotFound
    )
}
