//! The static route table.
//!
//! Routes are declared once at startup and never mutated: path, name, and
//! the access metadata the navigation guard evaluates (`requires_auth`,
//! `roles`). An empty `roles` slice means any authenticated role may enter.
//! Table-level `redirect` entries model the section roots (`/`, `/student`,
//! ...) that forward to a concrete page.

pub mod guard;

use studyhall_core::Role;

/// Well-known paths referenced by the guard and the navigator.
pub mod paths {
    /// Login page (unauthenticated).
    pub const LOGIN: &str = "/login";
    /// Registration page (unauthenticated).
    pub const REGISTER: &str = "/register";
    /// Generic dashboard, the fallback landing page for any session.
    pub const DASHBOARD: &str = "/dashboard";
    /// Student section landing page.
    pub const STUDENT_HOME: &str = "/student/home";
    /// Parent section landing page.
    pub const PARENT_HOME: &str = "/parent/home";
    /// Teacher section landing page.
    pub const TEACHER_HOME: &str = "/teacher/home";
    /// Institution section landing page.
    pub const INSTITUTION_HOME: &str = "/institution/home";
    /// Super-admin section landing page.
    pub const ADMIN_HOME: &str = "/admin/home";
}

/// A declared route and its access metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Exact path this route matches.
    pub path: &'static str,
    /// Route name.
    pub name: &'static str,
    /// Whether an active session is required to enter.
    pub requires_auth: bool,
    /// Roles allowed to enter; empty means any authenticated role.
    pub roles: &'static [Role],
    /// Table-level forward to another path, resolved before the guard runs.
    pub redirect: Option<&'static str>,
}

const STUDENT: &[Role] = &[Role::Student];
const PARENT: &[Role] = &[Role::Parent];
const TEACHER: &[Role] = &[Role::Teacher];
const INSTITUTION: &[Role] = &[Role::Institution];
const SUPER_ADMIN: &[Role] = &[Role::SuperAdmin];

macro_rules! route {
    ($path:expr, $name:expr) => {
        Route {
            path: $path,
            name: $name,
            requires_auth: false,
            roles: &[],
            redirect: None,
        }
    };
    ($path:expr, $name:expr, auth) => {
        Route {
            path: $path,
            name: $name,
            requires_auth: true,
            roles: &[],
            redirect: None,
        }
    };
    ($path:expr, $name:expr, auth, $roles:expr) => {
        Route {
            path: $path,
            name: $name,
            requires_auth: true,
            roles: $roles,
            redirect: None,
        }
    };
}

/// The full route table.
pub const ROUTES: &[Route] = &[
    Route {
        path: "/",
        name: "Root",
        requires_auth: false,
        roles: &[],
        redirect: Some(paths::DASHBOARD),
    },
    route!(paths::LOGIN, "Login"),
    route!(paths::REGISTER, "Register"),
    route!(paths::DASHBOARD, "Dashboard", auth),
    // Student section
    Route {
        path: "/student",
        name: "Student",
        requires_auth: true,
        roles: STUDENT,
        redirect: Some(paths::STUDENT_HOME),
    },
    route!(paths::STUDENT_HOME, "StudentHome", auth, STUDENT),
    route!("/student/exercise", "StudentExercise", auth, STUDENT),
    route!("/student/report", "StudentReport", auth, STUDENT),
    route!("/student/profile", "StudentProfile", auth, STUDENT),
    // Parent section
    Route {
        path: "/parent",
        name: "Parent",
        requires_auth: true,
        roles: PARENT,
        redirect: Some(paths::PARENT_HOME),
    },
    route!(paths::PARENT_HOME, "ParentHome", auth, PARENT),
    route!("/parent/report", "ParentReport", auth, PARENT),
    route!("/parent/settings", "ParentSettings", auth, PARENT),
    // Teacher section
    Route {
        path: "/teacher",
        name: "Teacher",
        requires_auth: true,
        roles: TEACHER,
        redirect: Some(paths::TEACHER_HOME),
    },
    route!(paths::TEACHER_HOME, "TeacherHome", auth, TEACHER),
    route!("/teacher/class", "TeacherClass", auth, TEACHER),
    route!("/teacher/student", "TeacherStudent", auth, TEACHER),
    // Institution section
    Route {
        path: "/institution",
        name: "Institution",
        requires_auth: true,
        roles: INSTITUTION,
        redirect: Some(paths::INSTITUTION_HOME),
    },
    route!(paths::INSTITUTION_HOME, "InstitutionHome", auth, INSTITUTION),
    route!("/institution/teacher", "InstitutionTeacher", auth, INSTITUTION),
    route!("/institution/report", "InstitutionReport", auth, INSTITUTION),
    // Super-admin section
    Route {
        path: "/admin",
        name: "Admin",
        requires_auth: true,
        roles: SUPER_ADMIN,
        redirect: Some(paths::ADMIN_HOME),
    },
    route!(paths::ADMIN_HOME, "AdminHome", auth, SUPER_ADMIN),
    route!("/admin/users", "AdminUsers", auth, SUPER_ADMIN),
    route!("/admin/ai-config", "AdminAiConfig", auth, SUPER_ADMIN),
    route!("/admin/system", "AdminSystem", auth, SUPER_ADMIN),
];

/// Catch-all for paths the table does not declare.
pub const NOT_FOUND: Route = Route {
    path: "*",
    name: "NotFound",
    requires_auth: false,
    roles: &[],
    redirect: None,
};

/// Find the route matching `path` exactly, falling back to [`NOT_FOUND`].
#[must_use]
pub fn find(path: &str) -> &'static Route {
    ROUTES
        .iter()
        .find(|route| route.path == path)
        .unwrap_or(&NOT_FOUND)
}

/// The default landing path for a role.
///
/// Unrecognized or absent roles fall back to the generic dashboard; this
/// must hold even when no profile exists, so stale navigation attempts
/// issued after logout degrade instead of failing.
#[must_use]
pub fn home_path(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Student) => paths::STUDENT_HOME,
        Some(Role::Parent) => paths::PARENT_HOME,
        Some(Role::Teacher) => paths::TEACHER_HOME,
        Some(Role::Institution) => paths::INSTITUTION_HOME,
        Some(Role::SuperAdmin) => paths::ADMIN_HOME,
        Some(Role::Unknown) | None => paths::DASHBOARD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_exact_match() {
        assert_eq!(find("/login").name, "Login");
        assert_eq!(find("/admin/users").name, "AdminUsers");
    }

    #[test]
    fn test_find_unknown_path_is_not_found() {
        assert_eq!(find("/no/such/page").name, "NotFound");
        assert_eq!(find("").name, "NotFound");
    }

    #[test]
    fn test_section_roots_redirect_to_homes() {
        assert_eq!(find("/").redirect, Some(paths::DASHBOARD));
        assert_eq!(find("/student").redirect, Some(paths::STUDENT_HOME));
        assert_eq!(find("/admin").redirect, Some(paths::ADMIN_HOME));
    }

    #[test]
    fn test_home_path_per_role() {
        assert_eq!(home_path(Some(Role::Student)), paths::STUDENT_HOME);
        assert_eq!(home_path(Some(Role::Parent)), paths::PARENT_HOME);
        assert_eq!(home_path(Some(Role::Teacher)), paths::TEACHER_HOME);
        assert_eq!(home_path(Some(Role::Institution)), paths::INSTITUTION_HOME);
        assert_eq!(home_path(Some(Role::SuperAdmin)), paths::ADMIN_HOME);
    }

    #[test]
    fn test_home_path_fallback() {
        assert_eq!(home_path(None), paths::DASHBOARD);
        assert_eq!(home_path(Some(Role::Unknown)), paths::DASHBOARD);
    }

    #[test]
    fn test_redirect_targets_exist_in_table() {
        for route in ROUTES {
            if let Some(target) = route.redirect {
                assert_ne!(find(target).name, "NotFound", "dangling redirect on {}", route.path);
            }
        }
    }

    #[test]
    fn test_role_sections_require_auth() {
        for route in ROUTES {
            if !route.roles.is_empty() {
                assert!(route.requires_auth, "{} has roles but no auth", route.path);
            }
        }
    }
}
