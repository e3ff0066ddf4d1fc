/*
[INPUT]:  RefreshCoordinator, DashboardClient, account filter watch, CancellationToken
[OUTPUT]: One task per refreshable page publishing highlighted views
[POS]:    Page layer - fetch results and highlight reverts applied on one task per page
[UPDATE]: When adding pages or changing how fetches reach the view
*/

pub mod dashboard;
pub mod orders;
pub mod positions;

pub use dashboard::{DashboardPage, DashboardView};
pub use orders::{OrdersPage, OrdersView};
pub use positions::{PositionsPage, PositionsView};

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use valar_refresh::{
    ChangeTracker, HighlightPolicy, HighlightTimings, RefreshCallback, RefreshCoordinator,
    RefreshRoute, RegistrationGuard, Route,
};

use crate::api::{self, DashboardClient};

const RESULT_BUFFER: usize = 16;

/// What a page fetch needs besides the account filter.
#[derive(Debug, Clone)]
pub struct FetchSource {
    pub client: DashboardClient,
    /// Fixed trade date for the orders page; the server's current date otherwise
    pub trade_date: Option<String>,
}

/// Resolves highlight durations against the live refresh interval.
#[derive(Debug, Clone)]
pub struct HighlightContext {
    timings: HighlightTimings,
    coordinator: RefreshCoordinator,
}

impl HighlightContext {
    pub fn new(timings: HighlightTimings, coordinator: RefreshCoordinator) -> Self {
        Self {
            timings,
            coordinator,
        }
    }

    pub fn duration(&self, policy: HighlightPolicy) -> Duration {
        self.timings
            .duration(policy, self.coordinator.config().interval_ms)
    }
}

/// A refreshable page: how to fetch it and how fetched data becomes a view.
pub trait PageModel: Send + 'static {
    type Data: Send + 'static;
    type Key: Clone + Eq + Hash + Send + 'static;
    type View: Clone + Default + Send + Sync + 'static;

    const ROUTE: RefreshRoute;
    /// Pages that show nothing until an account is selected
    const REQUIRES_ACCOUNTS: bool;

    fn fetch(
        source: &FetchSource,
        accounts: &[String],
    ) -> impl Future<Output = api::Result<Self::Data>> + Send;

    /// Replace the shown data, feeding every highlighted field through `tracker`.
    fn apply(
        &mut self,
        data: Self::Data,
        tracker: &mut ChangeTracker<Self::Key>,
        highlight: &HighlightContext,
    );

    fn clear(&mut self, tracker: &mut ChangeTracker<Self::Key>);

    fn view(&self, tracker: &ChangeTracker<Self::Key>) -> Self::View;
}

/// Published state of one page.
#[derive(Debug, Clone, Default)]
pub struct PageView<V> {
    pub body: V,
    pub accounts: Vec<String>,
    pub fetched_at: Option<DateTime<Local>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageDeps {
    pub coordinator: RefreshCoordinator,
    pub source: FetchSource,
    pub highlight: HighlightTimings,
    pub precision: u32,
}

pub struct PageHandle<V> {
    route: RefreshRoute,
    view: watch::Receiver<PageView<V>>,
    task: JoinHandle<()>,
}

impl<V: Clone> PageHandle<V> {
    pub fn route(&self) -> RefreshRoute {
        self.route
    }

    pub fn snapshot(&self) -> PageView<V> {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageView<V>> {
        self.view.clone()
    }

    /// Wait for the page task after its shutdown token was cancelled.
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }
}

struct FetchOutcome<D> {
    generation: u64,
    result: api::Result<D>,
}

struct PageRunner<M: PageModel> {
    model: M,
    tracker: ChangeTracker<M::Key>,
    deps: PageDeps,
    highlight: HighlightContext,
    accounts: watch::Receiver<Vec<String>>,
    filter: Arc<[String]>,
    generation: u64,
    registration: Option<RegistrationGuard>,
    results_tx: mpsc::Sender<FetchOutcome<M::Data>>,
    results_rx: mpsc::Receiver<FetchOutcome<M::Data>>,
    view_tx: watch::Sender<PageView<M::View>>,
    fetched_at: Option<DateTime<Local>>,
    last_error: Option<String>,
}

/// Register the page's refresh callback and start its task.
///
/// The callback is installed before this returns, so a trigger issued right
/// after already reaches the page.
pub fn spawn_page<M: PageModel>(
    model: M,
    deps: PageDeps,
    accounts: watch::Receiver<Vec<String>>,
    shutdown: CancellationToken,
) -> PageHandle<M::View> {
    let (view_tx, view_rx) = watch::channel(PageView::default());
    let (results_tx, results_rx) = mpsc::channel(RESULT_BUFFER);

    let mut runner = PageRunner {
        model,
        tracker: ChangeTracker::new(deps.precision),
        highlight: HighlightContext::new(deps.highlight, deps.coordinator.clone()),
        deps,
        accounts,
        filter: Arc::from(Vec::new()),
        generation: 0,
        registration: None,
        results_tx,
        results_rx,
        view_tx,
        fetched_at: None,
        last_error: None,
    };
    runner.register();
    runner.publish();

    PageHandle {
        route: M::ROUTE,
        view: view_rx,
        task: tokio::spawn(runner.run(shutdown)),
    }
}

impl<M: PageModel> PageRunner<M> {
    async fn run(mut self, shutdown: CancellationToken) {
        info!(route = %M::ROUTE, accounts = self.filter.len(), "page started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = self.accounts.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.on_filter_changed();
                }
                Some(outcome) = self.results_rx.recv() => self.on_fetched(outcome),
                _ = self.tracker.next_revert() => self.publish(),
            }
        }

        // Releases the callback unless a newer page instance replaced it.
        self.registration.take();
        self.tracker.clear();
        info!(route = %M::ROUTE, "page stopped");
    }

    /// Install a callback bound to the current filter, replacing the previous one.
    fn register(&mut self) {
        self.filter = Arc::from(self.accounts.borrow_and_update().clone());
        self.generation += 1;

        let generation = self.generation;
        let accounts = self.filter.clone();
        let source = self.deps.source.clone();
        let results_tx = self.results_tx.clone();
        let callback = RefreshCallback::tracked(move || {
            let accounts = accounts.clone();
            let source = source.clone();
            let results_tx = results_tx.clone();
            async move {
                let result = M::fetch(&source, &accounts).await;
                // A closed channel means the page is gone.
                let _ = results_tx.send(FetchOutcome { generation, result }).await;
            }
        });

        let guard = self.deps.coordinator.register(M::ROUTE, callback).into_guard();
        self.registration = Some(guard);
        debug!(route = %M::ROUTE, generation, accounts = ?self.filter, "page callback registered");
    }

    fn on_filter_changed(&mut self) {
        self.register();

        if M::REQUIRES_ACCOUNTS && self.filter.is_empty() {
            self.model.clear(&mut self.tracker);
            self.fetched_at = None;
            self.last_error = None;
            self.publish();
            return;
        }
        self.publish();

        if self.deps.coordinator.current_page() == Some(Route::from(M::ROUTE)) {
            self.deps.coordinator.trigger_refresh();
        }
    }

    fn on_fetched(&mut self, outcome: FetchOutcome<M::Data>) {
        if outcome.generation != self.generation {
            debug!(
                route = %M::ROUTE,
                generation = outcome.generation,
                current = self.generation,
                "dropping result fetched for a previous account filter"
            );
            return;
        }

        match outcome.result {
            Ok(data) => {
                self.model.apply(data, &mut self.tracker, &self.highlight);
                self.fetched_at = Some(Local::now());
                self.last_error = None;
                debug!(
                    route = %M::ROUTE,
                    tracked = self.tracker.len(),
                    pending_reverts = self.tracker.pending_reverts(),
                    "page data applied"
                );
            }
            Err(err) => {
                warn!(route = %M::ROUTE, error = %err, "page refresh failed; keeping last data");
                self.last_error = Some(err.to_string());
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.view_tx.send_replace(PageView {
            body: self.model.view(&self.tracker),
            accounts: self.filter.to_vec(),
            fetched_at: self.fetched_at,
            error: self.last_error.clone(),
        });
    }
}
