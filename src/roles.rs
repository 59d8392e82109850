//! Role and department vocabulary.
//!
//! The elevated-role set is the only authorization boundary in the portal:
//! membership, no hierarchy.

pub const ELEVATED_ROLES: [&str; 5] = [
    "Chairman",
    "CEO",
    "President",
    "Vice President",
    "Group President",
];

/// Department sentinel for company-wide posts.
pub const ALL_DEPARTMENTS: &str = "All";
pub const C_SUITE: &str = "C-Suite";
pub const ANONYMOUS_C_SUITE: &str = "Anonymous-C-Suite";

pub const DEPARTMENTS: [&str; 8] = [
    "Engineering",
    "Design",
    "HR",
    "Finance",
    "Marketing",
    "Ops",
    "Sales",
    "Legal",
];

/// Targets offered for anonymous feedback besides plain departments.
pub const FEEDBACK_ROUTES: [&str; 4] = ["Department Head", "Specific Person", "C-Suite", "Admin"];

pub fn is_elevated_role(role: &str) -> bool {
    ELEVATED_ROLES.contains(&role)
}

/// True for a real department or one of the routing sentinels.
pub fn is_known_department(department: &str) -> bool {
    DEPARTMENTS.contains(&department)
        || [ALL_DEPARTMENTS, C_SUITE, ANONYMOUS_C_SUITE].contains(&department)
}
