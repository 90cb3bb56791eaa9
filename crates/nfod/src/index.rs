//! Sidecar → owning group lookup.

use std::sync::Arc;

use dashmap::DashMap;
use nfostore::{ArtifactId, GroupRecord};

/// In-memory map from sidecar id to the group that owns it.
///
/// Entries are written once when a group is created (or restored) and
/// dropped when it is evicted. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct SidecarIndex {
    owners: Arc<DashMap<ArtifactId, ArtifactId>>,
}

impl SidecarIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every sidecar of `record`.
    pub fn register(&self, record: &GroupRecord) {
        for sidecar in &record.sidecars {
            self.owners.insert(sidecar.id.clone(), record.id.clone());
        }
    }

    pub fn owner(&self, sidecar: &ArtifactId) -> Option<ArtifactId> {
        self.owners.get(sidecar).map(|entry| entry.value().clone())
    }

    /// Returns whether an entry was present.
    pub fn remove(&self, sidecar: &ArtifactId) -> bool {
        self.owners.remove(sidecar).is_some()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use nfostore::SidecarEntry;

    fn record_with_sidecars(n: usize) -> GroupRecord {
        let now = Utc::now();
        GroupRecord {
            id: ArtifactId::generate(b"group"),
            release: "Release".to_string(),
            filename: "r.nfo".to_string(),
            date: None,
            files: None,
            size: None,
            has_raw: false,
            sidecars: (0..n)
                .map(|i| SidecarEntry {
                    id: ArtifactId::generate(&[i as u8]),
                    name: format!("{i}.sfv"),
                    path: None,
                })
                .collect(),
            created_at: now,
            expires_at: now + Duration::seconds(60),
        }
    }

    #[test]
    fn test_register_resolves_every_sidecar() {
        let index = SidecarIndex::new();
        let record = record_with_sidecars(3);
        index.register(&record);

        assert_eq!(index.len(), 3);
        for sidecar in &record.sidecars {
            assert_eq!(index.owner(&sidecar.id), Some(record.id.clone()));
        }
        assert_eq!(index.owner(&record.id), None);
    }

    #[test]
    fn test_remove_twice() {
        let index = SidecarIndex::new();
        let record = record_with_sidecars(1);
        index.register(&record);
        let sidecar = &record.sidecars[0].id;

        assert!(index.remove(sidecar));
        assert!(!index.remove(sidecar));
        assert!(index.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let index = SidecarIndex::new();
        let other = index.clone();
        index.register(&record_with_sidecars(2));
        assert_eq!(other.len(), 2);
    }
}
