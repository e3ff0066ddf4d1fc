/*
[INPUT]:  SettingsStore, page registrations, presentation-layer commands
[OUTPUT]: Periodic and manual dispatch of page refresh callbacks, busy state snapshots
[POS]:    Orchestration layer - owns refresh config, the auto-refresh timer and dispatch
[UPDATE]: When changing timer arming rules, busy-state semantics or persistence timing
*/

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{PageRefreshRegistry, RefreshCallback, Registration};
use crate::route::{RefreshRoute, Route};
use crate::settings::{self, RefreshConfig, SettingsStore};

/// How long `is_refreshing` stays up for callbacks that cannot report completion.
pub const BUSY_WINDOW: Duration = Duration::from_millis(1_000);

/// Everything the presentation layer renders about refresh state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSnapshot {
    pub enabled: bool,
    pub interval_ms: u64,
    pub current_page: Option<Route>,
    pub is_refreshing: bool,
    pub in_flight: usize,
    pub armed: bool,
}

#[derive(Debug)]
struct TimerTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TimerTask {
    fn cancel(self) {
        self.shutdown.cancel();
        self.handle.abort();
    }
}

#[derive(Debug)]
struct State {
    config: RefreshConfig,
    current_page: Option<Route>,
    busy_generation: u64,
    busy_window_open: bool,
    in_flight: usize,
    timer: Option<TimerTask>,
    closed: bool,
}

impl State {
    fn is_refreshing(&self) -> bool {
        self.busy_window_open || self.in_flight > 0
    }
}

struct Inner {
    store: Arc<dyn SettingsStore>,
    registry: PageRefreshRegistry,
    state: Mutex<State>,
    snapshot_tx: watch::Sender<RefreshSnapshot>,
    busy_window: Duration,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State) {
        self.snapshot_tx.send_replace(snapshot_of(state));
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
    }
}

fn snapshot_of(state: &State) -> RefreshSnapshot {
    RefreshSnapshot {
        enabled: state.config.enabled,
        interval_ms: state.config.interval_ms,
        current_page: state.current_page,
        is_refreshing: state.is_refreshing(),
        in_flight: state.in_flight,
        armed: state.timer.is_some(),
    }
}

/// Drives periodic and manual refresh of whichever page is active.
///
/// Build one at startup and clone the handle into every consumer; clones share
/// state. None of the public operations fail: storage problems are logged and the
/// in-memory state still changes, and page callbacks run detached so their errors
/// and panics stay with the page.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// Load the persisted config and arm the timer if it is enabled.
    ///
    /// Without a Tokio runtime the coordinator still works in memory, but no timer
    /// is armed and triggers are ignored.
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_busy_window(store, BUSY_WINDOW)
    }

    pub fn with_busy_window(store: Arc<dyn SettingsStore>, busy_window: Duration) -> Self {
        let config = settings::load_config(store.as_ref());
        info!(
            enabled = config.enabled,
            interval_ms = config.interval_ms,
            "refresh settings loaded"
        );

        let state = State {
            config,
            current_page: None,
            busy_generation: 0,
            busy_window_open: false,
            in_flight: 0,
            timer: None,
            closed: false,
        };
        let (snapshot_tx, _rx) = watch::channel(snapshot_of(&state));

        let coordinator = Self {
            inner: Arc::new(Inner {
                store,
                registry: PageRefreshRegistry::new(),
                state: Mutex::new(state),
                snapshot_tx,
                busy_window,
            }),
        };

        {
            let mut state = coordinator.inner.lock_state();
            coordinator.rearm(&mut state);
            coordinator.inner.publish(&state);
        }
        coordinator
    }

    pub fn registry(&self) -> &PageRefreshRegistry {
        &self.inner.registry
    }

    /// Shorthand for `registry().register(..)`.
    pub fn register(&self, route: RefreshRoute, callback: RefreshCallback) -> Registration {
        self.inner.registry.register(route, callback)
    }

    pub fn config(&self) -> RefreshConfig {
        self.inner.lock_state().config
    }

    pub fn current_page(&self) -> Option<Route> {
        self.inner.lock_state().current_page
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_state().is_refreshing()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock_state().in_flight
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock_state().timer.is_some()
    }

    pub fn snapshot(&self) -> RefreshSnapshot {
        snapshot_of(&self.inner.lock_state())
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<RefreshSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.inner.lock_state();
        let changed = state.config.enabled != enabled;
        state.config.enabled = enabled;
        settings::save_config(self.inner.store.as_ref(), &state.config);
        info!(enabled, "auto refresh toggled");
        if changed {
            self.rearm(&mut state);
        }
        self.inner.publish(&state);
    }

    pub fn set_interval_ms(&self, interval_ms: u64) {
        let mut state = self.inner.lock_state();
        let changed = state.config.interval_ms != interval_ms;
        state.config.interval_ms = interval_ms;
        settings::save_config(self.inner.store.as_ref(), &state.config);
        info!(
            interval_ms,
            label = %settings::interval_label(interval_ms),
            "refresh interval changed"
        );
        if changed {
            self.rearm(&mut state);
        }
        self.inner.publish(&state);
    }

    pub fn set_current_page(&self, route: Route) {
        let mut state = self.inner.lock_state();
        if state.current_page == Some(route) {
            return;
        }
        state.current_page = Some(route);
        debug!(route = %route, refreshable = route.is_refreshable(), "current page changed");
        self.rearm(&mut state);
        self.inner.publish(&state);
    }

    /// Run the current page's callback now, fire-and-forget.
    pub fn trigger_refresh(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("trigger_refresh called outside a Tokio runtime; ignored");
            return;
        };

        let route = self.inner.lock_state().current_page;
        let callback = route
            .and_then(Route::refresh_route)
            .and_then(|refresh_route| self.inner.registry.lookup(refresh_route));

        let mut state = self.inner.lock_state();
        match callback {
            Some(callback) if callback.is_tracked() => {
                state.in_flight += 1;
                let guard = InFlightGuard {
                    inner: Arc::downgrade(&self.inner),
                };
                runtime.spawn(async move {
                    let _guard = guard;
                    callback.start().await;
                });
            }
            callback => {
                if let Some(callback) = callback {
                    runtime.spawn(async move {
                        callback.start().await;
                    });
                }
                state.busy_generation += 1;
                state.busy_window_open = true;
                let generation = state.busy_generation;
                let inner = Arc::downgrade(&self.inner);
                let busy_window = self.inner.busy_window;
                runtime.spawn(async move {
                    tokio::time::sleep(busy_window).await;
                    close_busy_window(&inner, generation);
                });
            }
        }
        debug!(
            route = ?route,
            in_flight = state.in_flight,
            "refresh triggered"
        );
        self.inner.publish(&state);
    }

    /// Stop the timer for good; later config changes are persisted but never re-arm.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock_state();
        state.closed = true;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        info!("refresh coordinator shut down");
        self.inner.publish(&state);
    }

    fn on_tick(&self) {
        let page = self.current_page();
        match page {
            Some(route) if route.is_refreshable() => self.trigger_refresh(),
            _ => debug!(route = ?page, "tick dropped; page is not refreshable"),
        }
    }

    // Always a fresh timer, never an adjusted one, so the phase restarts cleanly.
    fn rearm(&self, state: &mut State) {
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        if state.closed || !state.config.should_arm() {
            debug!(enabled = state.config.enabled, "refresh timer disarmed");
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("no Tokio runtime; refresh timer not armed");
            return;
        };

        let period = Duration::from_millis(state.config.interval_ms);
        let shutdown = CancellationToken::new();
        let handle = runtime.spawn(run_timer(
            Arc::downgrade(&self.inner),
            period,
            shutdown.clone(),
        ));
        state.timer = Some(TimerTask { shutdown, handle });
        debug!(interval_ms = state.config.interval_ms, "refresh timer armed");
    }
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

async fn run_timer(inner: Weak<Inner>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                RefreshCoordinator { inner }.on_tick();
            }
        }
    }
}

fn close_busy_window(inner: &Weak<Inner>, generation: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut state = inner.lock_state();
    // A later trigger owns the window now.
    if state.busy_generation != generation {
        return;
    }
    state.busy_window_open = false;
    inner.publish(&state);
}

struct InFlightGuard {
    inner: Weak<Inner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.lock_state();
        state.in_flight = state.in_flight.saturating_sub(1);
        inner.publish(&state);
    }
}
