//! Short-lived artifact storage for rendered info files.
//!
//! Groups (an info file plus any attached sidecars) are stored as a few
//! blobs addressed by [`ArtifactId`]. Storage is not durable in any
//! promised sense: everything here is expected to be evicted minutes after
//! it is written.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nfostore::{ArtifactId, ArtifactStore, BlobKind, FileStore};
//!
//! let store = FileStore::at_path("/var/lib/nfoview/store").unwrap();
//!
//! let id = ArtifactId::generate(b"payload");
//! store.put(&id, BlobKind::Raw, b"payload").unwrap();
//!
//! if let Some(data) = store.get(&id, BlobKind::Raw).unwrap() {
//!     println!("Got {} bytes", data.len());
//! }
//!
//! store.remove(&id, BlobKind::Raw).unwrap();
//! ```

pub mod config;
pub mod id;
pub mod record;
pub mod store;

pub use config::StoreConfig;
pub use id::{ArtifactId, IdError};
pub use record::{BlobKind, GroupRecord, SidecarEntry};
pub use store::{ArtifactStore, FileStore, RecordScan};
