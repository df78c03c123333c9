//! Platform roles.
//!
//! Every authenticated Studyhall user has exactly one role, and route access
//! is granted per role. The backend serializes roles as `snake_case` strings.

use serde::{Deserialize, Serialize};

/// A user's role on the platform.
///
/// The five known roles each map to a dedicated section of the application.
/// Role strings the client does not recognize deserialize to [`Role::Unknown`]
/// instead of failing, so a profile persisted by a newer backend still
/// restores; the navigation layer treats `Unknown` like "no role" and falls
/// back to the generic dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Learner working through exercises and reports.
    Student,
    /// Guardian with read access to a student's progress.
    Parent,
    /// Instructor managing classes and students.
    Teacher,
    /// Institution operator managing teachers and reporting.
    Institution,
    /// Platform operator with full administrative access.
    SuperAdmin,
    /// Any role string this client version does not know about.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// The five roles this client version knows about.
    pub const KNOWN: [Self; 5] = [
        Self::Student,
        Self::Parent,
        Self::Teacher,
        Self::Institution,
        Self::SuperAdmin,
    ];

    /// Whether this is one of the five known roles.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Student => "student",
            Self::Parent => "parent",
            Self::Teacher => "teacher",
            Self::Institution => "institution",
            Self::SuperAdmin => "super_admin",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "parent" => Ok(Self::Parent),
            "teacher" => Ok(Self::Teacher),
            "institution" => Ok(Self::Institution),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
