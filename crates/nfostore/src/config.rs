//! Store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the artifact store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base path for storage.
    /// Blobs go in `{base_path}/objects/`, records in `{base_path}/records/`.
    pub base_path: PathBuf,
}

impl StoreConfig {
    /// Create a config with a specific base path.
    pub fn with_base_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
        }
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.base_path.join("objects")
    }

    pub fn records_dir(&self) -> PathBuf {
        self.base_path.join("records")
    }

    /// Scratch space for writes in flight; same filesystem as the final blobs.
    pub fn staging_dir(&self) -> PathBuf {
        self.base_path.join("staging")
    }
}
