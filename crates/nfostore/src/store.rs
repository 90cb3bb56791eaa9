//! FileStore: filesystem-backed artifact storage.
//!
//! Layout:
//! ```text
//! {base_path}/
//! ├── objects/
//! │   └── ab/
//! │       ├── cde123....png   # rendered image
//! │       └── cde123....nfo   # raw payload (groups that opted in, every sidecar)
//! ├── records/
//! │   └── ab/
//! │       └── cde123....json  # GroupRecord
//! └── staging/
//!     └── <uuid>              # writes in flight
//! ```
//!
//! Every write lands in `staging/` first and is renamed into place, so a
//! reader sees either the whole blob or nothing. Removal of a missing blob
//! is not an error.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::id::ArtifactId;
use crate::record::{BlobKind, GroupRecord};

/// Trait for artifact storage backends.
pub trait ArtifactStore: Send + Sync {
    /// Atomically write a blob, replacing any previous content.
    fn put(&self, id: &ArtifactId, kind: BlobKind, data: &[u8]) -> Result<()>;

    /// Read a blob. Returns `Ok(None)` if it doesn't exist.
    fn get(&self, id: &ArtifactId, kind: BlobKind) -> Result<Option<Vec<u8>>>;

    /// Check if a blob exists without reading it.
    fn exists(&self, id: &ArtifactId, kind: BlobKind) -> bool;

    /// Delete a blob. Returns `Ok(false)` if it was already gone.
    fn remove(&self, id: &ArtifactId, kind: BlobKind) -> Result<bool>;

    /// Every readable group record, plus the paths of any that failed to parse.
    fn scan_records(&self) -> Result<RecordScan>;

    /// Write the group record. Call last: its presence marks the group complete.
    fn put_record(&self, record: &GroupRecord) -> Result<()> {
        let json = serde_json::to_vec(record).context("failed to serialize group record")?;
        self.put(&record.id, BlobKind::Record, &json)
    }

    /// Read and parse a group record.
    fn record(&self, id: &ArtifactId) -> Result<Option<GroupRecord>> {
        match self.get(id, BlobKind::Record)? {
            Some(json) => {
                let record = serde_json::from_slice(&json)
                    .with_context(|| format!("failed to parse group record {id}"))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

/// Result of walking the records directory.
#[derive(Debug, Default)]
pub struct RecordScan {
    pub records: Vec<GroupRecord>,
    pub corrupt: Vec<PathBuf>,
}

/// Filesystem-based artifact store.
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StoreConfig,
}

impl FileStore {
    /// Create a new FileStore with the given configuration.
    ///
    /// Creates the layout directories if they don't exist.
    pub fn new(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(config.objects_dir())
            .context("failed to create store objects directory")?;
        fs::create_dir_all(config.records_dir())
            .context("failed to create store records directory")?;
        fs::create_dir_all(config.staging_dir())
            .context("failed to create store staging directory")?;

        Ok(Self { config })
    }

    /// Create a FileStore at a specific path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(StoreConfig::with_base_path(path))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Where a blob lives (whether or not it exists).
    fn blob_path(&self, id: &ArtifactId, kind: BlobKind) -> PathBuf {
        let root = match kind {
            BlobKind::Record => self.config.records_dir(),
            BlobKind::Image | BlobKind::Raw => self.config.objects_dir(),
        };
        root.join(id.prefix())
            .join(format!("{}.{}", id.remainder(), kind.extension()))
    }

    /// Delete leftovers from writes interrupted by a crash.
    ///
    /// Returns how many staging files were removed.
    pub fn clear_staging(&self) -> Result<usize> {
        let dir = self.config.staging_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e).context("failed to list staging directory"),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry.context("failed to read staging entry")?.path();
            if path.is_file() {
                fs::remove_file(&path).context("failed to remove staging file")?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl ArtifactStore for FileStore {
    fn put(&self, id: &ArtifactId, kind: BlobKind, data: &[u8]) -> Result<()> {
        let final_path = self.blob_path(id, kind);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).context("failed to create prefix directory")?;
        }

        let staging_path = self.config.staging_dir().join(Uuid::new_v4().simple().to_string());
        fs::write(&staging_path, data).context("failed to write staging file")?;

        if let Err(e) = fs::rename(&staging_path, &final_path) {
            let _ = fs::remove_file(&staging_path);
            return Err(e).with_context(|| format!("failed to move {kind:?} blob {id} into place"));
        }

        Ok(())
    }

    fn get(&self, id: &ArtifactId, kind: BlobKind) -> Result<Option<Vec<u8>>> {
        match fs::read(self.blob_path(id, kind)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {kind:?} blob {id}")),
        }
    }

    fn exists(&self, id: &ArtifactId, kind: BlobKind) -> bool {
        self.blob_path(id, kind).is_file()
    }

    fn remove(&self, id: &ArtifactId, kind: BlobKind) -> Result<bool> {
        match fs::remove_file(self.blob_path(id, kind)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to remove {kind:?} blob {id}")),
        }
    }

    fn scan_records(&self) -> Result<RecordScan> {
        let mut scan = RecordScan::default();

        let shards = match fs::read_dir(self.config.records_dir()) {
            Ok(shards) => shards,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(scan),
            Err(e) => return Err(e).context("failed to list records directory"),
        };

        for shard in shards {
            let shard = shard.context("failed to read records shard")?.path();
            if !shard.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&shard).context("failed to list records shard")? {
                let path = entry.context("failed to read record entry")?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(BlobKind::Record.extension()) {
                    continue;
                }
                // A record can vanish between listing and reading if it is being evicted.
                let json = match fs::read(&path) {
                    Ok(json) => json,
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e).context("failed to read record file"),
                };
                match serde_json::from_slice::<GroupRecord>(&json) {
                    Ok(record) => scan.records.push(record),
                    Err(_) => scan.corrupt.push(path),
                }
            }
        }

        Ok(scan)
    }
}
