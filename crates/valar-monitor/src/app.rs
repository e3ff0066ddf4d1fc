/*
[INPUT]:  MonitorConfig, RefreshCoordinator, DashboardClient, CancellationToken
[OUTPUT]: Running page tasks plus command execution against the refresh pipeline
[POS]:    Application layer - wires pages to the coordinator and executes console commands
[UPDATE]: When adding pages or commands
*/

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use valar_refresh::settings::{INTERVAL_PRESETS, interval_label};
use valar_refresh::{RefreshCoordinator, RefreshRoute, Route};

use crate::api::DashboardClient;
use crate::command::{Command, HELP};
use crate::config::MonitorConfig;
use crate::pages::{
    DashboardPage, DashboardView, FetchSource, OrdersPage, OrdersView, PageDeps, PageHandle,
    PageView, PositionsPage, PositionsView, spawn_page,
};
use crate::render;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue(String),
    Quit,
}

pub struct App {
    coordinator: RefreshCoordinator,
    accounts: watch::Sender<Vec<String>>,
    dashboard: PageHandle<DashboardView>,
    positions: PageHandle<PositionsView>,
    orders: PageHandle<OrdersView>,
    shutdown: CancellationToken,
}

impl App {
    /// Spawn every page and navigate to the configured start page.
    pub fn start(
        config: &MonitorConfig,
        coordinator: RefreshCoordinator,
        client: DashboardClient,
        shutdown: CancellationToken,
    ) -> Self {
        let (accounts, accounts_rx) = watch::channel(config.accounts.clone());
        let deps = PageDeps {
            coordinator: coordinator.clone(),
            source: FetchSource {
                client,
                trade_date: config.trade_date.clone(),
            },
            highlight: config.highlight.timings,
            precision: config.highlight.precision,
        };

        let dashboard = spawn_page(
            DashboardPage::default(),
            deps.clone(),
            accounts_rx.clone(),
            shutdown.child_token(),
        );
        let positions = spawn_page(
            PositionsPage::default(),
            deps.clone(),
            accounts_rx.clone(),
            shutdown.child_token(),
        );
        let orders = spawn_page(OrdersPage::default(), deps, accounts_rx, shutdown.child_token());

        let app = Self {
            coordinator,
            accounts,
            dashboard,
            positions,
            orders,
            shutdown,
        };
        app.navigate(config.start_route());
        app
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Show `route`; refreshable pages load immediately like a fresh mount.
    pub fn navigate(&self, route: Route) {
        self.coordinator.set_current_page(route);
        if route.is_refreshable() {
            self.coordinator.trigger_refresh();
        }
    }

    /// Returns false when the selection did not change.
    pub fn select_accounts(&self, accounts: Vec<String>) -> bool {
        self.accounts.send_if_modified(|current| {
            if *current == accounts {
                return false;
            }
            *current = accounts;
            true
        })
    }

    pub fn dashboard(&self) -> &PageHandle<DashboardView> {
        &self.dashboard
    }

    pub fn positions(&self) -> &PageHandle<PositionsView> {
        &self.positions
    }

    pub fn orders(&self) -> &PageHandle<OrdersView> {
        &self.orders
    }

    pub fn execute(&self, command: Command) -> CommandOutcome {
        let output = match command {
            Command::Refresh => {
                self.coordinator.trigger_refresh();
                "refresh triggered".to_string()
            }
            Command::Enable => {
                self.coordinator.set_enabled(true);
                self.status_line()
            }
            Command::Disable => {
                self.coordinator.set_enabled(false);
                self.status_line()
            }
            Command::Interval(interval_ms) => {
                self.coordinator.set_interval_ms(interval_ms);
                self.status_line()
            }
            Command::Page(route) => {
                self.navigate(route);
                format!("page {}", route.path())
            }
            Command::Accounts(accounts) => {
                let summary = if accounts.is_empty() {
                    "accounts cleared".to_string()
                } else {
                    format!("accounts: {}", accounts.join(", "))
                };
                if !self.select_accounts(accounts) {
                    return CommandOutcome::Continue("accounts unchanged".to_string());
                }
                summary
            }
            Command::Show => self.render_current(),
            Command::Status => self.status_line(),
            Command::Presets => presets_table(self.coordinator.config().interval_ms),
            Command::Help => HELP.to_string(),
            Command::Quit => return CommandOutcome::Quit,
        };
        CommandOutcome::Continue(output)
    }

    pub fn status_line(&self) -> String {
        let snapshot = self.coordinator.snapshot();
        let page = snapshot
            .current_page
            .map(|route| route.path())
            .unwrap_or("-");
        format!(
            "auto refresh: {}  interval: {}  page: {}  refreshing: {}  in flight: {}",
            if snapshot.enabled { "on" } else { "off" },
            interval_label(snapshot.interval_ms),
            page,
            if snapshot.is_refreshing { "yes" } else { "no" },
            snapshot.in_flight,
        )
    }

    /// Text rendering of the current page, or a note for pages without data.
    pub fn render_current(&self) -> String {
        match self.coordinator.current_page().and_then(Route::refresh_route) {
            Some(route) => self.render(route),
            None => {
                let page = self
                    .coordinator
                    .current_page()
                    .map(|route| route.path())
                    .unwrap_or("-");
                format!("{page} has no live data")
            }
        }
    }

    pub fn render(&self, route: RefreshRoute) -> String {
        match route {
            RefreshRoute::Dashboard => render_page(route, &self.dashboard.snapshot()),
            RefreshRoute::Positions => render_page(route, &self.positions.snapshot()),
            RefreshRoute::Orders => render_page(route, &self.orders.snapshot()),
        }
    }

    /// Stop the timer, cancel every page and wait for them to finish.
    pub async fn shutdown_and_wait(self) -> Result<()> {
        let Self {
            coordinator,
            dashboard,
            positions,
            orders,
            shutdown,
            ..
        } = self;
        coordinator.shutdown();
        shutdown.cancel();

        let joined = tokio::time::timeout(SHUTDOWN_TIMEOUT, async move {
            let (dashboard, positions, orders) =
                tokio::join!(dashboard.join(), positions.join(), orders.join());
            for (route, result) in [
                (RefreshRoute::Dashboard, dashboard),
                (RefreshRoute::Positions, positions),
                (RefreshRoute::Orders, orders),
            ] {
                if let Err(err) = result {
                    warn!(route = %route, error = %err, "page task ended abnormally");
                }
            }
        })
        .await;

        if joined.is_err() {
            return Err(anyhow!("page shutdown timed out after {SHUTDOWN_TIMEOUT:?}"));
        }
        info!("pages stopped");
        Ok(())
    }
}

fn render_page<V: std::fmt::Display>(route: RefreshRoute, view: &PageView<V>) -> String {
    let mut out = String::new();
    let accounts = if view.accounts.is_empty() {
        "none".to_string()
    } else {
        view.accounts.join(", ")
    };
    let fetched = view
        .fetched_at
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let _ = writeln!(
        out,
        "{} {}",
        render::heading(Route::from(route).path()),
        render::dim(format!("accounts: {accounts}  fetched: {fetched}"))
    );
    if let Some(error) = &view.error {
        let _ = writeln!(out, "  last refresh failed: {error}");
    }
    let _ = write!(out, "{}", view.body);
    out.trim_end().to_string()
}

fn presets_table(current_ms: u64) -> String {
    INTERVAL_PRESETS
        .iter()
        .map(|preset| {
            let marker = if preset.interval_ms == current_ms { "*" } else { " " };
            format!("{marker} {:>6}  {} ms", preset.label, preset.interval_ms)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
