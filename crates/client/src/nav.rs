//! The navigation controller.
//!
//! Owns the current location and applies the route table and guard to every
//! navigation attempt. It also consumes the session-expired signal raised by
//! the HTTP layer on 401 responses, turning it into a redirect to the login
//! page on the next poll.

use crate::notify::SessionWatch;
use crate::routes::guard::{self, GuardDecision};
use crate::routes::{self, paths};
use crate::session::SessionRead;

/// Redirect chains longer than this indicate a route-table cycle.
const MAX_REDIRECT_HOPS: usize = 8;

/// Tracks the current location and resolves navigation attempts.
#[derive(Debug)]
pub struct Navigator {
    current: String,
    watch: SessionWatch,
}

impl Navigator {
    /// Create a navigator at the root location.
    #[must_use]
    pub fn new(watch: SessionWatch) -> Self {
        Self {
            current: "/".to_string(),
            watch,
        }
    }

    /// The current location.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Resolve a navigation attempt to `path` and move there.
    ///
    /// Table-level redirects and guard redirects are followed until a route
    /// is entered, up to a bounded number of hops. A chain that fails to
    /// settle (a misconfigured table) stops where it is rather than looping;
    /// the final location is returned either way.
    pub fn navigate(&mut self, path: &str, session: &impl SessionRead) -> &str {
        let mut target = path.to_string();

        for _ in 0..MAX_REDIRECT_HOPS {
            let route = routes::find(&target);

            if let Some(forward) = route.redirect {
                target = forward.to_string();
                continue;
            }

            match guard::evaluate(route, session) {
                GuardDecision::Allow => break,
                GuardDecision::Redirect(to) if to == target => break,
                GuardDecision::Redirect(to) => target = to.to_string(),
            }
        }

        if target != self.current {
            tracing::debug!(from = %self.current, to = %target, "navigated");
        }
        self.current = target;
        &self.current
    }

    /// Consume a pending session-expired signal, redirecting to the login
    /// page. Returns whether a redirect happened.
    ///
    /// Idempotent with respect to location: a 401 received while already on
    /// the login page leaves the location unchanged (the persisted session
    /// was already purged by the HTTP layer).
    pub fn poll_session(&mut self) -> bool {
        if !self.watch.take() {
            return false;
        }

        if self.current == paths::LOGIN {
            return false;
        }

        tracing::info!(from = %self.current, "session expired, returning to login");
        self.current = paths::LOGIN.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use studyhall_core::Role;

    use super::*;

    struct Stub {
        logged_in: bool,
        role: Option<Role>,
    }

    impl SessionRead for Stub {
        fn is_logged_in(&self) -> bool {
            self.logged_in
        }

        fn role(&self) -> Option<Role> {
            self.role
        }
    }

    fn anonymous() -> Stub {
        Stub {
            logged_in: false,
            role: None,
        }
    }

    fn logged_in(role: Role) -> Stub {
        Stub {
            logged_in: true,
            role: Some(role),
        }
    }

    fn navigator() -> Navigator {
        Navigator::new(SessionWatch::new())
    }

    #[test]
    fn test_starts_at_root() {
        assert_eq!(navigator().current(), "/");
    }

    #[test]
    fn test_follows_table_redirect_then_guard() {
        // "/" forwards to the dashboard; anonymous visitors are then sent
        // to login by the guard.
        let mut nav = navigator();
        assert_eq!(nav.navigate("/", &anonymous()), "/login");

        let mut nav = navigator();
        assert_eq!(nav.navigate("/", &logged_in(Role::Teacher)), "/dashboard");
    }

    #[test]
    fn test_section_root_settles_on_home() {
        let mut nav = navigator();
        assert_eq!(
            nav.navigate("/student", &logged_in(Role::Student)),
            "/student/home"
        );
    }

    #[test]
    fn test_wrong_role_lands_on_own_home() {
        let mut nav = navigator();
        assert_eq!(
            nav.navigate("/admin/users", &logged_in(Role::Parent)),
            "/parent/home"
        );
    }

    #[test]
    fn test_logged_in_login_attempt_goes_to_dashboard() {
        let mut nav = navigator();
        assert_eq!(
            nav.navigate("/login", &logged_in(Role::Student)),
            "/dashboard"
        );
    }

    #[test]
    fn test_poll_without_signal_is_noop() {
        let mut nav = navigator();
        nav.navigate("/dashboard", &logged_in(Role::Student));
        assert!(!nav.poll_session());
        assert_eq!(nav.current(), "/dashboard");
    }

    #[test]
    fn test_poll_redirects_to_login_once() {
        let watch = SessionWatch::new();
        let mut nav = Navigator::new(watch.clone());
        nav.navigate("/teacher/class", &logged_in(Role::Teacher));

        watch.raise();
        assert!(nav.poll_session());
        assert_eq!(nav.current(), "/login");

        // Signal was consumed
        assert!(!nav.poll_session());
    }

    #[test]
    fn test_poll_on_login_page_leaves_location() {
        let watch = SessionWatch::new();
        let mut nav = Navigator::new(watch.clone());
        nav.navigate("/login", &anonymous());

        watch.raise();
        assert!(!nav.poll_session());
        assert_eq!(nav.current(), "/login");
        // But the signal is still consumed
        assert!(!watch.is_raised());
    }
}
