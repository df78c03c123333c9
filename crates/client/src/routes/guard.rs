//! The navigation guard.
//!
//! A pure policy function over (route, session): it reads the session and
//! returns a [`GuardDecision`], never mutating state or touching the
//! network. The navigation controller applies the decision.

use crate::session::SessionRead;

use super::{Route, home_path, paths};

/// The guard's verdict for a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Enter the requested route.
    Allow,
    /// Go to this path instead.
    Redirect(&'static str),
}

/// Evaluate the access rules for entering `route`.
///
/// The rules apply in order; the first that matches decides:
///
/// 1. The route requires auth and no session is active: go to the login
///    page.
/// 2. The route restricts roles and the session's role is not among them:
///    go to that role's own home page (the generic dashboard when the role
///    is unrecognized or the profile is somehow absent).
/// 3. A logged-in user asks for the login or register page: go to the
///    dashboard.
/// 4. Otherwise enter.
#[must_use]
pub fn evaluate(route: &Route, session: &impl SessionRead) -> GuardDecision {
    if route.requires_auth && !session.is_logged_in() {
        return GuardDecision::Redirect(paths::LOGIN);
    }

    if !route.roles.is_empty() && !session.has_role(route.roles) {
        return GuardDecision::Redirect(home_path(session.role()));
    }

    if session.is_logged_in() && (route.path == paths::LOGIN || route.path == paths::REGISTER) {
        return GuardDecision::Redirect(paths::DASHBOARD);
    }

    GuardDecision::Allow
}
