//! Deadline-driven eviction of artifact groups.
//!
//! One reaper task owns a min-heap of deadlines. `schedule` pushes a ticket
//! over a channel; the reaper sleeps until the earliest deadline, then hands
//! each due ticket to a blocking task that deletes the group's blobs. Armed
//! groups cost a heap entry each, not a task or a thread.
//!
//! There is no cancel and no renew: a scheduled ticket fires exactly once,
//! unless the process shuts down first. Records carry their own deadline, so
//! the next start re-arms whatever was abandoned.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use nfostore::{ArtifactId, ArtifactStore, BlobKind, GroupRecord};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::index::SidecarIndex;

/// Stand-in deadline for delays too long to represent. Roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Everything needed to delete one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionTicket {
    pub group: ArtifactId,
    pub sidecars: Vec<ArtifactId>,
    pub blobs: Vec<(ArtifactId, BlobKind)>,
}

impl EvictionTicket {
    pub fn for_record(record: &GroupRecord) -> Self {
        Self {
            group: record.id.clone(),
            sidecars: record.sidecar_ids(),
            blobs: record.owned_blobs(),
        }
    }
}

/// Outcome of one eviction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub removed: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Delete every blob a ticket names.
///
/// Records go first so the group stops resolving before anything else
/// disappears, then sidecar index entries, then the remaining blobs. Each
/// removal stands alone: an absent blob counts as `missing`, a failing one
/// is logged and skipped. Running this twice for the same ticket is harmless.
pub fn evict(
    store: &dyn ArtifactStore,
    index: &SidecarIndex,
    ticket: &EvictionTicket,
) -> EvictionReport {
    let mut report = EvictionReport::default();

    let (records, others): (Vec<_>, Vec<_>) = ticket
        .blobs
        .iter()
        .partition(|(_, kind)| *kind == BlobKind::Record);

    let mut remove = |id: &ArtifactId, kind: BlobKind| match store.remove(id, kind) {
        Ok(true) => report.removed += 1,
        Ok(false) => report.missing += 1,
        Err(e) => {
            report.failed += 1;
            tracing::warn!(
                group.id = %ticket.group,
                blob.id = %id,
                blob.kind = ?kind,
                error = %e,
                "Failed to remove blob during eviction"
            );
        }
    };

    for (id, kind) in records {
        remove(id, *kind);
    }
    for sidecar in &ticket.sidecars {
        index.remove(sidecar);
    }
    for (id, kind) in others {
        remove(id, *kind);
    }

    report
}

/// A ticket waiting in the reaper's heap.
#[derive(Debug)]
struct Armed {
    deadline: Instant,
    seq: u64,
    ticket: EvictionTicket,
}

impl Ord for Armed {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest deadline on top; seq keeps equal deadlines in arrival order.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Armed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Armed {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Armed {}

/// Handle for arming evictions. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EvictionScheduler {
    tx: mpsc::UnboundedSender<(Instant, EvictionTicket)>,
    pending: Arc<AtomicUsize>,
}

impl EvictionScheduler {
    /// Start the reaper task. It runs until `cancel` fires or every
    /// scheduler handle is dropped and nothing is left to evict.
    pub fn spawn(
        store: Arc<dyn ArtifactStore>,
        index: SidecarIndex,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        let reaper = Reaper {
            rx,
            store,
            index,
            pending: pending.clone(),
            cancel,
        };
        let handle = tokio::spawn(reaper.run());

        (Self { tx, pending }, handle)
    }

    /// Arm a one-shot eviction `delay` from now. Delays past what `Instant`
    /// can hold are clamped to [`FAR_FUTURE`].
    pub fn schedule(&self, ticket: EvictionTicket, delay: Duration) {
        let now = Instant::now();
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.schedule_at(ticket, deadline);
    }

    pub fn schedule_at(&self, ticket: EvictionTicket, deadline: Instant) {
        let group = ticket.group.clone();
        self.pending.fetch_add(1, AtomicOrdering::SeqCst);
        if self.tx.send((deadline, ticket)).is_err() {
            self.pending.fetch_sub(1, AtomicOrdering::SeqCst);
            tracing::warn!(
                group.id = %group,
                "Eviction reaper is gone; group will not be evicted this run"
            );
        }
    }

    /// Tickets armed but not yet fully evicted.
    pub fn pending(&self) -> usize {
        self.pending.load(AtomicOrdering::SeqCst)
    }
}

struct Reaper {
    rx: mpsc::UnboundedReceiver<(Instant, EvictionTicket)>,
    store: Arc<dyn ArtifactStore>,
    index: SidecarIndex,
    pending: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

impl Reaper {
    async fn run(mut self) {
        let mut heap: BinaryHeap<Armed> = BinaryHeap::new();
        let mut seq: u64 = 0;
        let mut open = true;

        loop {
            let next = heap.peek().map(|armed| armed.deadline);
            if !open && next.is_none() {
                break;
            }
            let wake = next.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(abandoned = heap.len(), "Eviction reaper shutting down");
                    break;
                }
                msg = self.rx.recv(), if open => match msg {
                    Some((deadline, ticket)) => {
                        heap.push(Armed { deadline, seq, ticket });
                        seq += 1;
                    }
                    None => open = false,
                },
                _ = sleep_until(wake), if next.is_some() => {
                    let now = Instant::now();
                    while heap.peek().is_some_and(|armed| armed.deadline <= now) {
                        if let Some(armed) = heap.pop() {
                            self.fire(armed.ticket);
                        }
                    }
                }
            }
        }
    }

    fn fire(&self, ticket: EvictionTicket) {
        let store = self.store.clone();
        let index = self.index.clone();
        let pending = self.pending.clone();

        tokio::task::spawn_blocking(move || {
            let report = evict(store.as_ref(), &index, &ticket);
            pending.fetch_sub(1, AtomicOrdering::SeqCst);
            tracing::info!(
                group.id = %ticket.group,
                removed = report.removed,
                missing = report.missing,
                failed = report.failed,
                "🧹 Group evicted"
            );
        });
    }
}
