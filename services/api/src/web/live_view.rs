//! services/api/src/web/live_view.rs
//!
//! The live view synchronizer. A mounted view registers with the change dispatcher,
//! fetches its section once, and re-fetches in full whenever the case table
//! changes. Observers read the latest snapshot through a `watch` channel.

use campus_support_core::domain::CASES_TABLE;
use campus_support_core::ports::{CaseRepository, PortResult};
use campus_support_core::sync::{ChangeDispatcher, Subscription};
use campus_support_core::views::{DashboardSection, DashboardView};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// One completed fetch of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub section: DashboardSection,
    /// Increments with every completed re-fetch; the mount fetch is revision 0.
    pub revision: u64,
    pub view: DashboardView,
}

/// Runs the section's query (if it has one) and renders the result.
pub async fn fetch_view(
    section: DashboardSection,
    repo: &dyn CaseRepository,
) -> PortResult<DashboardView> {
    let cases = match section.query() {
        Some(filter) => repo.list_cases(filter).await?,
        None => Vec::new(),
    };
    Ok(section.render(&cases))
}

pub struct LiveView {
    section: DashboardSection,
    snapshot: watch::Receiver<Arc<ViewSnapshot>>,
    refresh_tx: mpsc::UnboundedSender<()>,
    cancel: CancellationToken,
    // Held only so that dropping the view unregisters it.
    _subscription: Option<Subscription>,
}

impl LiveView {
    /// Mounts `section`: dispatcher registration, initial fetch, and the refetch task.
    /// Registration comes first so a change that lands during the initial fetch
    /// queues a follow-up refetch. A failed initial fetch is returned to the caller
    /// and the registration is dropped with it.
    pub async fn mount(
        section: DashboardSection,
        repo: Arc<dyn CaseRepository>,
        dispatcher: &ChangeDispatcher,
    ) -> PortResult<Self> {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        // Static sections have nothing to re-fetch.
        let subscription = section.query().map(|_| {
            let tx = refresh_tx.clone();
            dispatcher.register(CASES_TABLE, move |event| {
                debug!(kind = %event.kind, record_id = ?event.record_id, "Change for live view");
                let _ = tx.send(());
            })
        });

        let view = fetch_view(section, repo.as_ref()).await?;
        let (snapshot_tx, snapshot) = watch::channel(Arc::new(ViewSnapshot {
            section,
            revision: 0,
            view,
        }));

        let cancel = CancellationToken::new();
        tokio::spawn(refetch_loop(
            section,
            repo,
            refresh_rx,
            snapshot_tx,
            cancel.clone(),
        ));
        info!(%section, "Live view mounted");

        Ok(Self {
            section,
            snapshot,
            refresh_tx,
            cancel,
            _subscription: subscription,
        })
    }

    pub fn section(&self) -> DashboardSection {
        self.section
    }

    /// The most recent snapshot.
    pub fn current(&self) -> Arc<ViewSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Asks for a re-fetch without waiting for a change event.
    pub fn refresh(&self) {
        let _ = self.refresh_tx.send(());
    }

    /// Waits for the next completed re-fetch. Returns `None` once the view is torn down.
    /// Cancel-safe, so it can sit in a `select!`.
    pub async fn changed(&mut self) -> Option<Arc<ViewSnapshot>> {
        self.snapshot.changed().await.ok()?;
        Some(self.snapshot.borrow_and_update().clone())
    }

    pub fn watch(&self) -> watch::Receiver<Arc<ViewSnapshot>> {
        self.snapshot.clone()
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        self.cancel.cancel();
        debug!(section = %self.section, "Live view unmounted");
    }
}

async fn refetch_loop(
    section: DashboardSection,
    repo: Arc<dyn CaseRepository>,
    mut refresh_rx: mpsc::UnboundedReceiver<()>,
    snapshot_tx: watch::Sender<Arc<ViewSnapshot>>,
    cancel: CancellationToken,
) {
    let mut revision = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            signal = refresh_rx.recv() => {
                if signal.is_none() {
                    break;
                }
            }
        }
        // Signals that piled up while we waited are satisfied by this one fetch.
        while refresh_rx.try_recv().is_ok() {}

        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            fetched = fetch_view(section, repo.as_ref()) => fetched,
        };
        match fetched {
            Ok(view) => {
                revision += 1;
                let snapshot = Arc::new(ViewSnapshot {
                    section,
                    revision,
                    view,
                });
                if snapshot_tx.send(snapshot).is_err() {
                    break;
                }
            }
            Err(e) => {
                // Keep showing the previous snapshot; the next change retries.
                error!(%section, "Error refreshing live view: {:?}", e);
            }
        }
    }
    debug!(%section, "Live view refetch task stopped");
}
