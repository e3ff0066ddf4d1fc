/*
[INPUT]:  Navigation paths from the presentation layer
[OUTPUT]: Route identifiers and the closed set of refreshable routes
[POS]:    Routing vocabulary shared by coordinator, registry and pages
[UPDATE]: When adding pages or changing which pages auto-refresh
*/

use std::fmt;
use std::str::FromStr;

/// Every page the dashboard can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Positions,
    Orders,
    Modules,
    AccountConfig,
    Settings,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Login,
        Route::Dashboard,
        Route::Positions,
        Route::Orders,
        Route::Modules,
        Route::AccountConfig,
        Route::Settings,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Positions => "/positions",
            Route::Orders => "/orders",
            Route::Modules => "/modules",
            Route::AccountConfig => "/account-config",
            Route::Settings => "/settings",
        }
    }

    /// Parse a navigation path. Unknown paths land on the dashboard, matching the
    /// catch-all redirect of the router.
    pub fn from_path(path: &str) -> Route {
        let trimmed = path.trim().trim_end_matches('/');
        let normalized = trimmed.strip_prefix('/').unwrap_or(trimmed);
        match normalized {
            "login" => Route::Login,
            "positions" => Route::Positions,
            "orders" => Route::Orders,
            "modules" => Route::Modules,
            "account-config" => Route::AccountConfig,
            "settings" => Route::Settings,
            _ => Route::Dashboard,
        }
    }

    /// The refresh slot for this page, if it takes part in live refresh.
    pub fn refresh_route(self) -> Option<RefreshRoute> {
        match self {
            Route::Dashboard => Some(RefreshRoute::Dashboard),
            Route::Positions => Some(RefreshRoute::Positions),
            Route::Orders => Some(RefreshRoute::Orders),
            _ => None,
        }
    }

    pub fn is_refreshable(self) -> bool {
        self.refresh_route().is_some()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Route::from_path(s))
    }
}

/// Closed set of pages that own a refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshRoute {
    Dashboard,
    Positions,
    Orders,
}

impl RefreshRoute {
    pub const ALL: [RefreshRoute; 3] = [
        RefreshRoute::Dashboard,
        RefreshRoute::Positions,
        RefreshRoute::Orders,
    ];

    pub(crate) fn slot(self) -> usize {
        match self {
            RefreshRoute::Dashboard => 0,
            RefreshRoute::Positions => 1,
            RefreshRoute::Orders => 2,
        }
    }

    pub fn route(self) -> Route {
        match self {
            RefreshRoute::Dashboard => Route::Dashboard,
            RefreshRoute::Positions => Route::Positions,
            RefreshRoute::Orders => Route::Orders,
        }
    }
}

impl fmt::Display for RefreshRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.route().fmt(f)
    }
}

impl From<RefreshRoute> for Route {
    fn from(route: RefreshRoute) -> Self {
        route.route()
    }
}
