//! Reconciliation loop
//!
//! Owns the canonical purchase-order snapshot and keeps it in step with the
//! backend. Every successful fetch replaces the collection wholesale; the
//! backend is the single source of truth and a full replace of a small
//! dataset avoids stale-merge bugs. Views subscribe to snapshot changes and
//! unsubscribe by dropping the receiver; the interval loop is torn down
//! through its handle rather than leaked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::backend::client::BackendApi;
use crate::backend::types::PurchaseOrder;
use crate::workflow::busy::BusyTable;
use crate::workflow::catalog::TransitionSpec;
use crate::workflow::guard::evaluate;
use crate::workflow::notify::{NotificationSink, Severity};

pub type PoSnapshot = Arc<Vec<PurchaseOrder>>;

/// A purchase order joined with its client-side row state: the busy flag from
/// the side table and the transitions currently legal for it. While a row is
/// busy, all of its actions are withheld.
#[derive(Debug, Clone)]
pub struct PoRow {
    pub po: PurchaseOrder,
    pub busy: bool,
    pub actions: Vec<&'static TransitionSpec>,
}

pub struct Reconciler {
    backend: Arc<dyn BackendApi>,
    sink: Arc<dyn NotificationSink>,
    busy: BusyTable,
    snapshot_tx: watch::Sender<PoSnapshot>,
    loading: AtomicBool,
    poll_interval: Duration,
}

impl Reconciler {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        sink: Arc<dyn NotificationSink>,
        busy: BusyTable,
        poll_interval: Duration,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            backend,
            sink,
            busy,
            snapshot_tx,
            loading: AtomicBool::new(false),
            poll_interval,
        }
    }

    /// Subscribe to snapshot replacements. The receiver sees every published
    /// snapshot; dropping it is the unsubscription.
    pub fn subscribe(&self) -> watch::Receiver<PoSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> PoSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn get(&self, id: u64) -> Option<PurchaseOrder> {
        self.snapshot().iter().find(|po| po.id == id).cloned()
    }

    /// True while a foreground fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn busy_table(&self) -> &BusyTable {
        &self.busy
    }

    /// The merged row view: server snapshot × busy side table × guard
    /// evaluation, recomputed from scratch on every call so a status change
    /// is never served from a stale evaluation.
    pub fn rows(&self) -> Vec<PoRow> {
        self.snapshot()
            .iter()
            .map(|po| {
                let busy = self.busy.is_busy(po.id);
                let actions = if busy { Vec::new() } else { evaluate(po) };
                PoRow {
                    po: po.clone(),
                    busy,
                    actions,
                }
            })
            .collect()
    }

    /// Refreshes the snapshot from the backend.
    ///
    /// Foreground mode raises the loading flag for the duration and surfaces
    /// fetch errors through the sink. Background mode is silent: errors are
    /// logged and the caller's interval carries on at the next tick. Failures
    /// never propagate; worst case is a stale snapshot corrected by the next
    /// successful fetch.
    pub async fn refresh(&self, background: bool) {
        if !background {
            self.loading.store(true, Ordering::SeqCst);
        }
        match self.backend.fetch_purchase_orders().await {
            Ok(pos) => {
                debug!(count = pos.len(), background, "replacing purchase-order snapshot");
                // send_replace publishes even when no view is subscribed.
                let _ = self.snapshot_tx.send_replace(Arc::new(pos));
            }
            Err(err) => {
                if background {
                    debug!(error = %err, "background refresh failed, retrying on next tick");
                } else {
                    warn!(error = %err, "purchase-order fetch failed");
                    self.sink.notify(&err.to_string(), Severity::Error);
                }
            }
        }
        if !background {
            self.loading.store(false, Ordering::SeqCst);
        }
    }

    /// Starts the polling loop: one immediate foreground fetch (view-enter),
    /// then silent background fetches at the configured interval until the
    /// returned handle is stopped.
    pub fn spawn_poll_loop(self: &Arc<Self>) -> PollLoopHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let reconciler = Arc::clone(self);
        let task = tokio::spawn(reconciler.run(stop_rx));
        PollLoopHandle { stop_tx, task }
    }

    async fn run(self: Arc<Self>, mut stop: watch::Receiver<bool>) {
        info!(interval_secs = self.poll_interval.as_secs_f64(), "reconciliation loop started");
        self.refresh(false).await;

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a fresh interval fires immediately; the
        // view-enter fetch above already covered it.
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.refresh(true).await;
                }
            }
        }
        info!("reconciliation loop stopped");
    }
}

/// Handle to a running poll loop. Dropping it ends the loop at its next
/// suspension point; [`stop`] additionally waits until the loop task has
/// finished, guaranteeing no fetch is issued afterwards.
///
/// [`stop`]: PollLoopHandle::stop
pub struct PollLoopHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollLoopHandle {
    /// Cancels the interval deterministically and waits for the loop task to
    /// finish. No fetch is issued after this returns.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}
