//! Artifact group lifecycle.
//!
//! A group is one rendered info file plus zero or more sidecars, created in
//! one call and evicted together after the retention window. Creation writes
//! every blob before the group record, and arms eviction only once all writes
//! have landed, so a lookup either sees the whole group or nothing.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use nfoconf::RenderConfig;
use nforaster::{render_document, GlyphMetrics, RenderError, RenderOptions};
use nfostore::{ArtifactId, ArtifactStore, BlobKind, GroupRecord, SidecarEntry};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::eviction::{EvictionScheduler, EvictionTicket};
use crate::index::SidecarIndex;

/// Errors surfaced by group operations.
///
/// Not-found is not an error here: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Missing fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{field} is not valid base64: {reason}")]
    Decode { field: String, reason: String },

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl GroupError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GroupError::Validation(_) | GroupError::Decode { .. } => StatusCode::BAD_REQUEST,
            GroupError::Render(_) | GroupError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A submitted group, still base64-encoded.
#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub payload_b64: String,
    pub release: String,
    pub filename: String,
    /// Keep the raw payload for download.
    pub save: bool,
    pub date: Option<String>,
    pub files: Option<String>,
    pub size: Option<String>,
    pub sidecars: Vec<NewSidecar>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSidecar {
    pub data_b64: String,
    pub name: String,
    pub path: Option<String>,
}

impl NewGroup {
    /// Every required field that is absent or blank, by wire name.
    pub fn validate(&self) -> Result<(), GroupError> {
        let mut missing = Vec::new();
        let blank = |s: &str| s.trim().is_empty();

        if blank(&self.payload_b64) {
            missing.push("nfo_data".to_string());
        }
        if blank(&self.release) {
            missing.push("release".to_string());
        }
        if blank(&self.filename) {
            missing.push("filename".to_string());
        }
        for (i, sidecar) in self.sidecars.iter().enumerate() {
            if blank(&sidecar.data_b64) {
                missing.push(format!("sfv[{i}].sfv_data"));
            }
            if blank(&sidecar.name) {
                missing.push(format!("sfv[{i}].name"));
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(GroupError::Validation(missing))
        }
    }
}

pub fn viewer_url(id: &ArtifactId) -> String {
    format!("/viewer/{id}")
}

pub fn image_url(id: &ArtifactId) -> String {
    format!("/image/{id}")
}

pub fn download_url(id: &ArtifactId) -> String {
    format!("/download/{id}")
}

pub fn sidecar_download_url(id: &ArtifactId) -> String {
    format!("/download_sfv/{id}")
}

/// What the viewer shows for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub id: ArtifactId,
    pub release: String,
    pub filename: String,
    pub date: Option<String>,
    pub files: Option<String>,
    pub size: Option<String>,
    /// `size` with its unit, e.g. "700 MB".
    pub size_label: Option<String>,
    pub image_url: String,
    pub raw_available: bool,
    pub download_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub sidecars: Vec<SidecarView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidecarView {
    pub id: ArtifactId,
    pub name: String,
    pub path: Option<String>,
    pub image_url: String,
    pub download_url: String,
}

impl GroupView {
    fn from_record(record: GroupRecord, raw_available: bool) -> Self {
        let sidecars = record
            .sidecars
            .into_iter()
            .map(|s| SidecarView {
                image_url: image_url(&s.id),
                download_url: sidecar_download_url(&s.id),
                id: s.id,
                name: s.name,
                path: s.path,
            })
            .collect();

        Self {
            image_url: image_url(&record.id),
            download_url: raw_available.then(|| download_url(&record.id)),
            size_label: record.size.as_ref().map(|size| format!("{size} MB")),
            id: record.id,
            release: record.release,
            filename: record.filename,
            date: record.date,
            files: record.files,
            size: record.size,
            raw_available,
            created_at: record.created_at,
            expires_at: record.expires_at,
            sidecars,
        }
    }
}

/// Raw bytes plus the name to offer them under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Startup restore summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub overdue: usize,
    pub corrupt: usize,
}

/// Build rasterizer options from configuration.
pub fn render_options(config: &RenderConfig) -> Result<RenderOptions, RenderError> {
    Ok(RenderOptions {
        metrics: GlyphMetrics::new(config.glyph_width, config.glyph_height),
        padding: config.padding,
        foreground: config.foreground.parse()?,
        background: config.background.parse()?,
    })
}

/// Creates, resolves and expires artifact groups.
#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn ArtifactStore>,
    render: RenderOptions,
    ttl: Duration,
    index: SidecarIndex,
    scheduler: EvictionScheduler,
}

impl GroupService {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        render: RenderOptions,
        ttl: Duration,
        index: SidecarIndex,
        scheduler: EvictionScheduler,
    ) -> Self {
        Self {
            store,
            render,
            ttl,
            index,
            scheduler,
        }
    }

    /// Wire up a fresh index and eviction reaper around `store`.
    pub fn start(
        store: Arc<dyn ArtifactStore>,
        render: RenderOptions,
        ttl: Duration,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let index = SidecarIndex::new();
        let (scheduler, reaper) = EvictionScheduler::spawn(store.clone(), index.clone(), cancel);
        (Self::new(store, render, ttl, index, scheduler), reaper)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn index(&self) -> &SidecarIndex {
        &self.index
    }

    pub fn pending_evictions(&self) -> usize {
        self.scheduler.pending()
    }

    /// Run blocking store work off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> Result<T, GroupError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ArtifactStore) -> anyhow::Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| GroupError::Storage(anyhow!("blocking store task failed: {e}")))?;
        Ok(result?)
    }

    /// Decode, render and store a group, then arm its eviction.
    #[tracing::instrument(
        name = "groups.create",
        skip(self, new),
        fields(release = %new.release, sidecars = new.sidecars.len(), save = new.save)
    )]
    pub async fn create(&self, new: NewGroup) -> Result<ArtifactId, GroupError> {
        new.validate()?;

        let store = self.store.clone();
        let render = self.render;
        let ttl = self.ttl;
        let record =
            tokio::task::spawn_blocking(move || write_group(store.as_ref(), &render, ttl, new))
                .await
                .map_err(|e| GroupError::Storage(anyhow!("group creation task failed: {e}")))??;

        self.index.register(&record);
        self.scheduler
            .schedule(EvictionTicket::for_record(&record), self.ttl);

        tracing::info!(
            group.id = %record.id,
            has_raw = record.has_raw,
            sidecars = record.sidecars.len(),
            expires_at = %record.expires_at,
            "📄 Group created"
        );
        Ok(record.id)
    }

    /// Resolve a group for display. Malformed, unknown and evicted ids all give `None`.
    pub async fn lookup(&self, id: &str) -> Result<Option<GroupView>, GroupError> {
        let Ok(id) = id.parse::<ArtifactId>() else {
            return Ok(None);
        };

        self.blocking(move |store| {
            let Some(record) = store.record(&id)? else {
                return Ok(None);
            };
            if !store.exists(&id, BlobKind::Image) {
                return Ok(None);
            }
            let raw_available = record.has_raw && store.exists(&id, BlobKind::Raw);
            Ok(Some(GroupView::from_record(record, raw_available)))
        })
        .await
    }

    /// The primary payload, if it was saved and has not been evicted.
    pub async fn fetch_raw(&self, id: &str) -> Result<Option<Download>, GroupError> {
        let Ok(id) = id.parse::<ArtifactId>() else {
            return Ok(None);
        };

        self.blocking(move |store| {
            let Some(record) = store.record(&id)? else {
                return Ok(None);
            };
            if !record.has_raw {
                return Ok(None);
            }
            Ok(store.get(&id, BlobKind::Raw)?.map(|bytes| Download {
                bytes,
                filename: record.filename,
            }))
        })
        .await
    }

    /// A sidecar's raw payload, resolved through the owning group.
    pub async fn fetch_sidecar_raw(&self, id: &str) -> Result<Option<Download>, GroupError> {
        let Ok(sidecar) = id.parse::<ArtifactId>() else {
            return Ok(None);
        };
        let Some(group) = self.index.owner(&sidecar) else {
            return Ok(None);
        };

        self.blocking(move |store| {
            let Some(record) = store.record(&group)? else {
                return Ok(None);
            };
            let Some(entry) = record.sidecar(&sidecar) else {
                return Ok(None);
            };
            let filename = entry.name.clone();
            Ok(store
                .get(&sidecar, BlobKind::Raw)?
                .map(|bytes| Download { bytes, filename }))
        })
        .await
    }

    /// PNG for a group or sidecar id, while the owning group is live.
    pub async fn fetch_image(&self, id: &str) -> Result<Option<Vec<u8>>, GroupError> {
        let Ok(id) = id.parse::<ArtifactId>() else {
            return Ok(None);
        };
        let group = self.index.owner(&id).unwrap_or_else(|| id.clone());

        self.blocking(move |store| {
            if !store.exists(&group, BlobKind::Record) {
                return Ok(None);
            }
            store.get(&id, BlobKind::Image)
        })
        .await
    }

    /// Rebuild the sidecar index and re-arm eviction for every stored group.
    ///
    /// Groups whose deadline passed while the process was down are evicted
    /// as soon as the reaper runs.
    pub async fn restore(&self) -> Result<RestoreReport, GroupError> {
        let scan = self.blocking(|store| store.scan_records()).await?;

        let mut report = RestoreReport {
            corrupt: scan.corrupt.len(),
            ..RestoreReport::default()
        };
        for path in &scan.corrupt {
            tracing::warn!(path = %path.display(), "Skipping unreadable group record");
        }

        let now = Utc::now();
        for record in scan.records {
            let remaining = (record.expires_at - now).to_std().unwrap_or(Duration::ZERO);
            if remaining.is_zero() {
                report.overdue += 1;
            }

            self.index.register(&record);
            self.scheduler
                .schedule(EvictionTicket::for_record(&record), remaining);
            report.restored += 1;
        }

        Ok(report)
    }
}

/// A decoded payload and its rendering.
struct Prepared {
    raw: Vec<u8>,
    png: Vec<u8>,
}

fn decode_base64(field: &str, data: &str) -> Result<Vec<u8>, GroupError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact.as_bytes()).map_err(|e| GroupError::Decode {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn prepare(field: &str, data: &str, render: &RenderOptions) -> Result<Prepared, GroupError> {
    let raw = decode_base64(field, data)?;
    let png = render_document(&raw, render)?.to_png()?;
    Ok(Prepared { raw, png })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Wall-clock expiry, clamped to about 30 years out so records stay
/// readable by any RFC 3339 parser.
fn deadline(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    let far_future = chrono::Duration::days(365 * 30);
    let delta = chrono::Duration::from_std(ttl)
        .unwrap_or(far_future)
        .min(far_future);
    now + delta
}

/// Everything `create` does that blocks: decode, render, write.
fn write_group(
    store: &dyn ArtifactStore,
    render: &RenderOptions,
    ttl: Duration,
    new: NewGroup,
) -> Result<GroupRecord, GroupError> {
    let primary = prepare("nfo_data", &new.payload_b64, render)?;

    let mut sidecars = Vec::with_capacity(new.sidecars.len());
    for (i, sidecar) in new.sidecars.into_iter().enumerate() {
        let prepared = prepare(&format!("sfv[{i}].sfv_data"), &sidecar.data_b64, render)?;
        let entry = SidecarEntry {
            id: ArtifactId::generate(&prepared.raw),
            name: sidecar.name.trim().to_string(),
            path: non_blank(sidecar.path),
        };
        sidecars.push((entry, prepared));
    }

    let now = Utc::now();
    let record = GroupRecord {
        id: ArtifactId::generate(&primary.raw),
        release: new.release.trim().to_string(),
        filename: new.filename.trim().to_string(),
        date: non_blank(new.date),
        files: non_blank(new.files),
        size: non_blank(new.size),
        has_raw: new.save,
        sidecars: sidecars.iter().map(|(entry, _)| entry.clone()).collect(),
        created_at: now,
        expires_at: deadline(now, ttl),
    };

    let mut written = Vec::new();
    if let Err(e) = write_blobs(store, &record, &primary, &sidecars, &mut written) {
        tracing::warn!(
            group.id = %record.id,
            written = written.len(),
            error = %e,
            "Group write failed; removing partial blobs"
        );
        for (id, kind) in written.iter().rev() {
            if let Err(e) = store.remove(id, *kind) {
                tracing::warn!(
                    blob.id = %id,
                    blob.kind = ?kind,
                    error = %e,
                    "Failed to remove partial blob"
                );
            }
        }
        return Err(GroupError::Storage(e));
    }

    Ok(record)
}

fn write_blobs(
    store: &dyn ArtifactStore,
    record: &GroupRecord,
    primary: &Prepared,
    sidecars: &[(SidecarEntry, Prepared)],
    written: &mut Vec<(ArtifactId, BlobKind)>,
) -> anyhow::Result<()> {
    let mut put = |id: &ArtifactId, kind: BlobKind, data: &[u8]| -> anyhow::Result<()> {
        // Track before writing: a failed rename may still leave the file behind.
        written.push((id.clone(), kind));
        store.put(id, kind, data)
    };

    for (entry, prepared) in sidecars {
        put(&entry.id, BlobKind::Raw, &prepared.raw)?;
        put(&entry.id, BlobKind::Image, &prepared.png)?;
    }
    put(&record.id, BlobKind::Image, &primary.png)?;
    if record.has_raw {
        put(&record.id, BlobKind::Raw, &primary.raw)?;
    }

    written.push((record.id.clone(), BlobKind::Record));
    store.put_record(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfostore::{FileStore, RecordScan};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn b64(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    fn new_group(save: bool) -> NewGroup {
        NewGroup {
            payload_b64: b64(b"\xDB\xDB Release X \xDB\xDB\r\nline two\r\n"),
            release: "Release X".to_string(),
            filename: "file.nfo".to_string(),
            save,
            size: Some("700".to_string()),
            ..NewGroup::default()
        }
    }

    fn service(dir: &Path, ttl: Duration) -> (GroupService, CancellationToken) {
        let store = Arc::new(FileStore::at_path(dir).unwrap());
        let cancel = CancellationToken::new();
        let (service, _reaper) =
            GroupService::start(store, RenderOptions::default(), ttl, cancel.clone());
        (service, cancel)
    }

    fn count_files(dir: &Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        entries
            .flatten()
            .map(|e| e.path())
            .map(|p: PathBuf| if p.is_dir() { count_files(&p) } else { 1 })
            .sum()
    }

    #[test]
    fn test_validate_lists_every_missing_field() {
        let group = NewGroup {
            payload_b64: "  ".to_string(),
            sidecars: vec![NewSidecar::default()],
            ..NewGroup::default()
        };
        match group.validate() {
            Err(GroupError::Validation(fields)) => assert_eq!(
                fields,
                vec!["nfo_data", "release", "filename", "sfv[0].sfv_data", "sfv[0].name"]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(GroupError::Validation(vec![]).status_code(), StatusCode::BAD_REQUEST);
        let decode = GroupError::Decode {
            field: "nfo_data".into(),
            reason: "bad".into(),
        };
        assert_eq!(decode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GroupError::Render(RenderError::NoLines).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GroupError::Storage(anyhow!("disk")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_decode_tolerates_line_wrapped_base64() {
        let wrapped = "aGVsbG8g\n d29y\r\nbGQ=";
        assert_eq!(decode_base64("nfo_data", wrapped).unwrap(), b"hello world");
        assert!(matches!(
            decode_base64("nfo_data", "not base64!"),
            Err(GroupError::Decode { .. })
        ));
    }

    #[test]
    fn test_render_options_from_config() {
        let options = render_options(&RenderConfig::default()).unwrap();
        assert_eq!(options, RenderOptions::default());

        let bad = RenderConfig {
            foreground: "chartreuse-ish".to_string(),
            ..RenderConfig::default()
        };
        assert!(render_options(&bad).is_err());
    }

    #[tokio::test]
    async fn test_create_then_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let (service, cancel) = service(temp_dir.path(), Duration::from_secs(300));

        let id = service.create(new_group(true)).await.unwrap();
        let view = service.lookup(id.as_str()).await.unwrap().expect("group should resolve");

        assert_eq!(view.release, "Release X");
        assert_eq!(view.filename, "file.nfo");
        assert_eq!(view.size_label.as_deref(), Some("700 MB"));
        assert_eq!(view.date, None);
        assert!(view.raw_available);
        assert_eq!(view.download_url, Some(format!("/download/{id}")));
        assert_eq!(service.pending_evictions(), 1);
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_unbounded_retention_still_serves() {
        let temp_dir = TempDir::new().unwrap();
        let (service, cancel) = service(temp_dir.path(), Duration::MAX);

        let id = service.create(new_group(true)).await.unwrap();
        let view = service.lookup(id.as_str()).await.unwrap().expect("group should resolve");

        assert!(view.expires_at > Utc::now() + chrono::Duration::days(365 * 29));
        assert_eq!(service.pending_evictions(), 1);
        cancel.cancel();
    }

    #[test]
    fn test_deadline_clamps_long_ttls() {
        let now = Utc::now();
        assert_eq!(deadline(now, Duration::from_secs(60)), now + chrono::Duration::seconds(60));
        let far = now + chrono::Duration::days(365 * 30);
        assert_eq!(deadline(now, Duration::MAX), far);
        assert_eq!(deadline(now, Duration::from_secs(86400 * 365 * 100)), far);
    }

    #[tokio::test]
    async fn test_fetch_image_for_group() {
        let temp_dir = TempDir::new().unwrap();
        let (service, cancel) = service(temp_dir.path(), Duration::from_secs(300));

        let id = service.create(new_group(false)).await.unwrap();
        let png = service.fetch_image(id.as_str()).await.unwrap().expect("image should exist");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_blank_document_without_padding_is_render_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::at_path(temp_dir.path()).unwrap());
        let options = RenderOptions {
            padding: 0,
            ..RenderOptions::default()
        };
        let cancel = CancellationToken::new();
        let (service, _reaper) =
            GroupService::start(store, options, Duration::from_secs(300), cancel.clone());

        let mut group = new_group(true);
        group.payload_b64 = b64(b"\r\n");
        let err = service.create(group).await.unwrap_err();

        assert!(matches!(err, GroupError::Render(RenderError::EmptyCanvas { .. })));
        assert_eq!(count_files(&temp_dir.path().join("objects")), 0);
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_malformed_ids_are_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let (service, cancel) = service(temp_dir.path(), Duration::from_secs(300));

        assert!(service.lookup("../etc/passwd").await.unwrap().is_none());
        assert!(service.fetch_raw("zz").await.unwrap().is_none());
        assert!(service.fetch_sidecar_raw("").await.unwrap().is_none());
        assert!(service.fetch_image("nope").await.unwrap().is_none());
        cancel.cancel();
    }

    /// Store that refuses to write group records.
    struct NoRecords(FileStore);

    impl ArtifactStore for NoRecords {
        fn put(&self, id: &ArtifactId, kind: BlobKind, data: &[u8]) -> anyhow::Result<()> {
            if kind == BlobKind::Record {
                anyhow::bail!("disk full");
            }
            self.0.put(id, kind, data)
        }
        fn get(&self, id: &ArtifactId, kind: BlobKind) -> anyhow::Result<Option<Vec<u8>>> {
            self.0.get(id, kind)
        }
        fn exists(&self, id: &ArtifactId, kind: BlobKind) -> bool {
            self.0.exists(id, kind)
        }
        fn remove(&self, id: &ArtifactId, kind: BlobKind) -> anyhow::Result<bool> {
            self.0.remove(id, kind)
        }
        fn scan_records(&self) -> anyhow::Result<RecordScan> {
            self.0.scan_records()
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_group() {
        let temp_dir = TempDir::new().unwrap();
        let store: Arc<dyn ArtifactStore> =
            Arc::new(NoRecords(FileStore::at_path(temp_dir.path()).unwrap()));
        let cancel = CancellationToken::new();
        let (service, _reaper) = GroupService::start(
            store,
            RenderOptions::default(),
            Duration::from_secs(300),
            cancel.clone(),
        );

        let mut group = new_group(true);
        group.sidecars.push(NewSidecar {
            data_b64: b64(b"file.rar DEADBEEF\n"),
            name: "release.sfv".to_string(),
            path: None,
        });

        let err = service.create(group).await.unwrap_err();
        assert!(matches!(err, GroupError::Storage(_)));
        assert_eq!(count_files(&temp_dir.path().join("objects")), 0);
        assert!(service.index().is_empty());
        assert_eq!(service.pending_evictions(), 0);
        cancel.cancel();
    }

    #[tokio::test]
    async fn test_restore_rearms_and_reindexes() {
        let temp_dir = TempDir::new().unwrap();

        let (first, cancel) = service(temp_dir.path(), Duration::from_secs(300));
        let mut group = new_group(true);
        group.sidecars.push(NewSidecar {
            data_b64: b64(b"a.rar 00000000\n"),
            name: "a.sfv".to_string(),
            path: Some("CD1".to_string()),
        });
        let id = first.create(group).await.unwrap();
        let sidecar = first.lookup(id.as_str()).await.unwrap().unwrap().sidecars[0].id.clone();
        cancel.cancel();

        let (second, cancel) = service(temp_dir.path(), Duration::from_secs(300));
        assert!(second.fetch_sidecar_raw(sidecar.as_str()).await.unwrap().is_none());

        let report = second.restore().await.unwrap();
        assert_eq!(report, RestoreReport { restored: 1, overdue: 0, corrupt: 0 });
        assert_eq!(second.pending_evictions(), 1);

        let download = second.fetch_sidecar_raw(sidecar.as_str()).await.unwrap().unwrap();
        assert_eq!(download.filename, "a.sfv");
        assert_eq!(download.bytes, b"a.rar 00000000\n");
        cancel.cancel();
    }
}
