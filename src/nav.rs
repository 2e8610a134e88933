//! Role registry: sidebar navigation entries and who may see them.

use crate::session::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavEntry {
    pub label: &'static str,
    pub path: &'static str,
    pub required_roles: &'static [Role],
}

impl NavEntry {
    #[must_use]
    pub fn visible_to(&self, role: Role) -> bool {
        self.required_roles.contains(&role)
    }
}

/// Sidebar entries in display order.
pub const NAV_ENTRIES: &[NavEntry] = &[
    NavEntry { label: "Approvals", path: "/crib-requests", required_roles: &[Role::CribMember] },
    NavEntry { label: "Accounts", path: "/accounts", required_roles: &[Role::Bank, Role::CribMember] },
    NavEntry { label: "Users", path: "/create-account", required_roles: &[Role::Bank] },
    NavEntry { label: "Facilities", path: "/facilities", required_roles: &[Role::Bank] },
    NavEntry { label: "Reports", path: "/reports", required_roles: &[Role::CribMember] },
    NavEntry { label: "Crib Report", path: "/crib-report", required_roles: &[Role::Bank] },
];

/// Entries `role` may see, in display order. No role, no entries.
#[must_use]
pub fn entries_for(role: Option<Role>) -> Vec<&'static NavEntry> {
    let Some(role) = role else {
        return Vec::new();
    };
    NAV_ENTRIES.iter().filter(|entry| entry.visible_to(role)).collect()
}

#[cfg(test)]
#[path = "nav_test.rs"]
mod tests;
