use std::fmt;

use super::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Plan,
}

impl Route {
    pub const DEFAULT_PROTECTED: Route = Route::Dashboard;

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Plan => "/dashboard/plan",
        }
    }

    /// Exact match on a known path; a trailing slash is tolerated
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        match normalized {
            "/login" => Some(Route::Login),
            "/dashboard" => Some(Route::Dashboard),
            "/dashboard/plan" => Some(Route::Plan),
            _ => None,
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect { from: String, to: Route },
}

impl RouteDecision {
    /// The route that ends up on screen
    pub fn target(&self) -> Route {
        match self {
            RouteDecision::Render(route) => *route,
            RouteDecision::Redirect { to, .. } => *to,
        }
    }
}

/// One redirect step, or `None` when `route` may render as-is
fn step(route: Route, authenticated: bool) -> Option<Route> {
    match (route.is_protected(), authenticated) {
        (true, false) => Some(Route::Login),
        (false, true) => Some(Route::DEFAULT_PROTECTED),
        _ => None,
    }
}

/// Decide what renders for `path`.
///
/// Root and unknown paths go to `/login`; redirects are followed until a route
/// is allowed to render, so an authenticated visit to `/` lands on `/dashboard`.
pub fn resolve(path: &str, session: &dyn SessionStore) -> RouteDecision {
    let authenticated = session.is_authenticated();

    let mut current = Route::from_path(path).unwrap_or(Route::Login);
    let mut redirected = Route::from_path(path).is_none();

    // Two steps at most: login <-> dashboard never loops for a fixed auth state.
    while let Some(next) = step(current, authenticated) {
        current = next;
        redirected = true;
    }

    if redirected {
        tracing::debug!(from = path, to = current.path(), "route redirected");
        RouteDecision::Redirect {
            from: path.to_string(),
            to: current,
        }
    } else {
        RouteDecision::Render(current)
    }
}
