//! Route table and the guard that keeps signed-out visitors off protected
//! views.
//!
//! DESIGN
//! ======
//! `RouteTable` resolves a raw path to a view (following static redirects
//! and the catch-all). `RouteGuard` then reads the session store at the
//! moment of navigation, never a boot-time snapshot, so a login or logout
//! that happens later is honored on the next check. Protected views allow
//! any signed-in user; there are no per-route role checks.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use std::collections::BTreeMap;

use crate::session::SessionStore;

pub const LOGIN_ROUTE: &str = "auth/login";
pub const DASHBOARD_ROUTE: &str = "dashboard";

const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    View(Access),
    Redirect(String),
}

/// Strip surrounding whitespace and slashes, plus any query or fragment.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].trim().trim_matches('/').to_owned()
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: BTreeMap<String, Entry>,
    fallback: String,
    login: String,
}

impl RouteTable {
    /// Empty table. Unknown paths go to `fallback`; the guard sends
    /// signed-out visitors to `login`.
    #[must_use]
    pub fn new(login: &str, fallback: &str) -> Self {
        Self { entries: BTreeMap::new(), fallback: normalize_path(fallback), login: normalize_path(login) }
    }

    /// Routes of the Daily Tools dashboard.
    #[must_use]
    pub fn default_routes() -> Self {
        Self::new(LOGIN_ROUTE, DASHBOARD_ROUTE)
            .redirect("", DASHBOARD_ROUTE)
            .redirect("auth", LOGIN_ROUTE)
            .view(LOGIN_ROUTE, Access::Public)
            .view(DASHBOARD_ROUTE, Access::Protected)
            .view("converter", Access::Public)
            .view("exchange-rate-calculator", Access::Public)
    }

    #[must_use]
    pub fn view(mut self, path: &str, access: Access) -> Self {
        self.entries.insert(normalize_path(path), Entry::View(access));
        self
    }

    #[must_use]
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.entries
            .insert(normalize_path(from), Entry::Redirect(normalize_path(to)));
        self
    }

    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login
    }

    /// Resolve `path` to a concrete view and its access level.
    ///
    /// Redirect chains longer than a few hops, or a fallback that is not a
    /// view, land on the login route as public.
    #[must_use]
    pub fn resolve(&self, path: &str) -> (String, Access) {
        let mut current = normalize_path(path);
        for _ in 0..MAX_REDIRECTS {
            match self.entries.get(&current) {
                Some(Entry::View(access)) => return (current, *access),
                Some(Entry::Redirect(to)) => current.clone_from(to),
                None if current == self.fallback => break,
                None => current.clone_from(&self.fallback),
            }
        }
        tracing::warn!(path, "route did not resolve to a view; using login route");
        (self.login.clone(), Access::Public)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::default_routes()
    }
}

// =============================================================================
// GUARD
// =============================================================================

/// Result of asking the guard about a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Proceed to this view.
    Allow(String),
    /// Navigation to `from` was cancelled; go to `to` instead.
    Redirect { from: String, to: String },
}

impl Navigation {
    /// The view the visitor ends up on.
    #[must_use]
    pub fn route(&self) -> &str {
        match self {
            Self::Allow(route) => route,
            Self::Redirect { to, .. } => to,
        }
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    session: SessionStore,
    routes: RouteTable,
}

impl RouteGuard {
    #[must_use]
    pub fn new(session: SessionStore, routes: RouteTable) -> Self {
        Self { session, routes }
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide where a navigation to `path` lands, using live session state.
    #[must_use]
    pub fn check(&self, path: &str) -> Navigation {
        let (route, access) = self.routes.resolve(path);
        if access == Access::Protected && !self.session.is_authenticated() {
            tracing::debug!(route = %route, "signed-out navigation redirected to login");
            return Navigation::Redirect { from: route, to: self.routes.login_route().to_owned() };
        }
        Navigation::Allow(route)
    }
}

// =============================================================================
// NAVIGATOR
// =============================================================================

/// Tracks the current view and runs every move through the guard.
pub struct Navigator {
    guard: RouteGuard,
    current: Option<String>,
}

impl Navigator {
    #[must_use]
    pub fn new(guard: RouteGuard) -> Self {
        Self { guard, current: None }
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn navigate(&mut self, path: &str) -> Navigation {
        let nav = self.guard.check(path);
        self.current = Some(nav.route().to_owned());
        nav
    }

    /// Re-check the current view after a session change. Returns the new
    /// navigation only when the visitor has to move.
    pub fn revalidate(&mut self) -> Option<Navigation> {
        let current = self.current.clone()?;
        let nav = self.guard.check(&current);
        if nav.route() == current {
            return None;
        }
        self.current = Some(nav.route().to_owned());
        Some(nav)
    }
}
