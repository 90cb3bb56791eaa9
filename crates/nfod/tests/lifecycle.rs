//! Integration tests for group creation, lookup and eviction
//!
//! Uses a real FileStore in a temp dir and short retention windows.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use nfod::eviction::{evict, EvictionTicket};
use nfod::{GroupService, NewGroup, NewSidecar};
use nforaster::RenderOptions;
use nfostore::{ArtifactStore, BlobKind, FileStore};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const NFO: &[u8] = b"\xDA\xC4\xC4\xBF\r\n\xB3 hi \xB3\r\n\xC0\xC4\xC4\xD9\r\n";

struct Fixture {
    groups: GroupService,
    store: Arc<FileStore>,
    cancel: CancellationToken,
    temp_dir: TempDir,
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn fixture(ttl: Duration) -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::at_path(temp_dir.path()).unwrap());
    let cancel = CancellationToken::new();
    let (groups, _reaper) =
        GroupService::start(store.clone(), RenderOptions::default(), ttl, cancel.clone());
    Fixture {
        groups,
        store,
        cancel,
        temp_dir,
    }
}

fn new_group(save: bool, sidecars: Vec<NewSidecar>) -> NewGroup {
    NewGroup {
        payload_b64: STANDARD.encode(NFO),
        release: "Demo.Release-GRP".to_string(),
        filename: "demo.nfo".to_string(),
        save,
        sidecars,
        ..NewGroup::default()
    }
}

fn sidecar(name: &str, body: &[u8]) -> NewSidecar {
    NewSidecar {
        data_b64: STANDARD.encode(body),
        name: name.to_string(),
        path: None,
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_identical_payloads_get_distinct_ids() {
    let f = fixture(Duration::from_secs(300));

    let mut handles = Vec::with_capacity(1000);
    for _ in 0..1000 {
        let groups = f.groups.clone();
        handles.push(tokio::spawn(async move {
            groups.create(new_group(false, Vec::new())).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle.await.unwrap().unwrap();
        assert!(ids.insert(id), "duplicate id issued");
    }
    assert_eq!(ids.len(), 1000);
    assert_eq!(f.groups.pending_evictions(), 1000);
}

#[tokio::test]
async fn test_raw_kept_only_when_saved() {
    let f = fixture(Duration::from_secs(300));

    let saved = f.groups.create(new_group(true, Vec::new())).await.unwrap();
    let download = f.groups.fetch_raw(saved.as_str()).await.unwrap().unwrap();
    assert_eq!(download.bytes, NFO);
    assert_eq!(download.filename, "demo.nfo");

    let unsaved = f.groups.create(new_group(false, Vec::new())).await.unwrap();
    assert!(f.groups.fetch_raw(unsaved.as_str()).await.unwrap().is_none());
    assert!(!f.store.exists(&unsaved, BlobKind::Raw));

    // The viewer still works without the raw payload.
    let view = f.groups.lookup(unsaved.as_str()).await.unwrap().unwrap();
    assert!(!view.raw_available);
    assert_eq!(view.download_url, None);
    assert!(f.groups.fetch_image(unsaved.as_str()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_sidecars_keep_submission_order() {
    let f = fixture(Duration::from_secs(300));

    let id = f
        .groups
        .create(new_group(
            false,
            vec![
                sidecar("cd1.sfv", b"a.r00 deadbeef\n"),
                sidecar("cd2.sfv", b"b.r00 cafebabe\n"),
            ],
        ))
        .await
        .unwrap();

    let view = f.groups.lookup(id.as_str()).await.unwrap().unwrap();
    let names: Vec<_> = view.sidecars.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["cd1.sfv", "cd2.sfv"]);

    let first = f.groups.fetch_sidecar_raw(view.sidecars[0].id.as_str()).await.unwrap().unwrap();
    assert_eq!(first.bytes, b"a.r00 deadbeef\n");
    assert_eq!(first.filename, "cd1.sfv");

    let second = f.groups.fetch_sidecar_raw(view.sidecars[1].id.as_str()).await.unwrap().unwrap();
    assert_eq!(second.bytes, b"b.r00 cafebabe\n");

    // Sidecar ids are not groups.
    assert!(f.groups.lookup(view.sidecars[0].id.as_str()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_group_disappears_everywhere() {
    let f = fixture(Duration::from_millis(300));

    let id = f
        .groups
        .create(new_group(true, vec![sidecar("a.sfv", b"x 00000000\n")]))
        .await
        .unwrap();
    let view = f.groups.lookup(id.as_str()).await.unwrap().unwrap();
    let sidecar_id = view.sidecars[0].id.clone();
    assert!(f.groups.fetch_image(sidecar_id.as_str()).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(f.groups.lookup(id.as_str()).await.unwrap().is_none());
    assert!(f.groups.fetch_raw(id.as_str()).await.unwrap().is_none());
    assert!(f.groups.fetch_image(id.as_str()).await.unwrap().is_none());
    assert!(f.groups.fetch_image(sidecar_id.as_str()).await.unwrap().is_none());
    assert!(f.groups.fetch_sidecar_raw(sidecar_id.as_str()).await.unwrap().is_none());

    assert_eq!(f.groups.pending_evictions(), 0);
    assert!(f.groups.index().is_empty());
    assert_eq!(count_files(&f.temp_dir.path().join("objects")), 0);
    assert_eq!(count_files(&f.temp_dir.path().join("records")), 0);
}

#[tokio::test]
async fn test_never_created_matches_evicted() {
    let f = fixture(Duration::from_secs(300));
    let unknown = "0123456789abcdef0123456789abcdef";

    assert!(f.groups.lookup(unknown).await.unwrap().is_none());
    assert!(f.groups.fetch_raw(unknown).await.unwrap().is_none());
    assert!(f.groups.fetch_image(unknown).await.unwrap().is_none());
    assert!(f.groups.fetch_sidecar_raw(unknown).await.unwrap().is_none());
}

#[tokio::test]
async fn test_double_eviction_is_harmless() {
    let f = fixture(Duration::from_secs(300));

    let id = f
        .groups
        .create(new_group(true, vec![sidecar("a.sfv", b"x 00000000\n")]))
        .await
        .unwrap();
    let record = f.store.record(&id).unwrap().unwrap();
    let ticket = EvictionTicket::for_record(&record);

    let first = evict(f.store.as_ref(), f.groups.index(), &ticket);
    assert!(first.removed > 0);
    assert_eq!(first.failed, 0);

    let second = evict(f.store.as_ref(), f.groups.index(), &ticket);
    assert_eq!(second.removed, 0);
    assert_eq!(second.failed, 0);

    assert!(f.groups.lookup(id.as_str()).await.unwrap().is_none());
}
