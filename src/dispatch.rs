//! View dispatcher: maps a path to the view to mount and the layout shell
//! around it.
//!
//! DESIGN
//! ======
//! The route table is static. Lookup tries exact routes first, then the
//! longest prefix route whose pattern matches a whole path segment
//! (`/profile` matches `/profile` and `/profile/123`, not `/profiles`).
//!
//! `navigate` runs the route guard on every call; nothing about a previous
//! decision is cached.

use crate::guard::{self, DenyReason, GuardDecision};
use crate::nav::{self, NavEntry};
use crate::session::{Role, Session};

// =============================================================================
// VIEWS AND LAYOUTS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewId {
    Landing,
    BankLogin,
    BankRegister,
    CribLogin,
    CribRegister,
    CustomerVerify,
    CustomerOtp,
    CustomerReport,
    Unauthorized,
    BankDashboard,
    Facilities,
    CustomerSearch,
    CustomerProfile,
    CreateAccount,
    BankCribReport,
    Accounts,
    ActivationRequests,
    ReportApproval,
    GenerateReport,
}

/// Shell a view is mounted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Bare page, no sidebar.
    Public,
    /// Sidebar shell with the bank's navigation entries.
    BankPortal,
    /// Sidebar shell with the CRIB member's navigation entries.
    CribPortal,
}

impl Layout {
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Bank => Self::BankPortal,
            Role::CribMember => Self::CribPortal,
        }
    }
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathMatch {
    Exact,
    Prefix,
}

/// Who may open a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Roles(&'static [Role]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteMount {
    pub pattern: &'static str,
    pub matching: PathMatch,
    pub view: ViewId,
    pub access: Access,
}

const fn public(pattern: &'static str, view: ViewId) -> RouteMount {
    RouteMount { pattern, matching: PathMatch::Exact, view, access: Access::Public }
}

const fn guarded(pattern: &'static str, view: ViewId, roles: &'static [Role]) -> RouteMount {
    RouteMount { pattern, matching: PathMatch::Exact, view, access: Access::Roles(roles) }
}

const BANK: &[Role] = &[Role::Bank];
const CRIB: &[Role] = &[Role::CribMember];
const BANK_OR_CRIB: &[Role] = &[Role::Bank, Role::CribMember];

pub const ROUTES: &[RouteMount] = &[
    public("/", ViewId::Landing),
    public("/bank-login", ViewId::BankLogin),
    public("/bank-register", ViewId::BankRegister),
    public("/crib-login", ViewId::CribLogin),
    public("/crib-register", ViewId::CribRegister),
    public("/cus-login", ViewId::CustomerVerify),
    public("/cus-register", ViewId::CustomerVerify),
    public("/verify", ViewId::CustomerVerify),
    public("/otp", ViewId::CustomerOtp),
    public("/report", ViewId::CustomerReport),
    public(guard::UNAUTHORIZED_PATH, ViewId::Unauthorized),
    guarded("/dashboard", ViewId::BankDashboard, BANK),
    guarded("/facilities", ViewId::Facilities, BANK),
    guarded("/search-profile", ViewId::CustomerSearch, BANK),
    RouteMount { pattern: "/profile", matching: PathMatch::Prefix, view: ViewId::CustomerProfile, access: Access::Roles(BANK) },
    guarded("/create-account", ViewId::CreateAccount, BANK),
    guarded("/crib-report", ViewId::BankCribReport, BANK),
    guarded("/accounts", ViewId::Accounts, BANK_OR_CRIB),
    guarded("/crib-requests", ViewId::ActivationRequests, CRIB),
    guarded("/reports", ViewId::ReportApproval, CRIB),
    guarded("/generate-report", ViewId::GenerateReport, CRIB),
];

/// Strip query, fragment and trailing slashes; `""` becomes `/`.
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

fn prefix_matches(pattern: &str, path: &str) -> bool {
    path.strip_prefix(pattern)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Route registered for `path`, if any.
#[must_use]
pub fn dispatch(path: &str) -> Option<&'static RouteMount> {
    let path = normalize(path);
    if let Some(exact) = ROUTES.iter().find(|r| r.matching == PathMatch::Exact && r.pattern == path) {
        return Some(exact);
    }
    let prefix = ROUTES
        .iter()
        .filter(|r| r.matching == PathMatch::Prefix && prefix_matches(r.pattern, path))
        .max_by_key(|r| r.pattern.len());
    if prefix.is_none() {
        tracing::debug!(path, "no route registered");
    }
    prefix
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Render { view: ViewId, layout: Layout, nav: Vec<&'static NavEntry> },
    Redirect { to: &'static str, reason: DenyReason },
    NotFound,
}

/// Resolve `path` for `session`: mount, redirect, or nothing registered.
#[must_use]
pub fn navigate(path: &str, session: &Session) -> Navigation {
    let Some(route) = dispatch(path) else {
        return Navigation::NotFound;
    };

    match route.access {
        Access::Public => Navigation::Render { view: route.view, layout: Layout::Public, nav: Vec::new() },
        Access::Roles(allowed) => match guard::check(allowed, session) {
            GuardDecision::Denied { redirect, reason } => Navigation::Redirect { to: redirect, reason },
            GuardDecision::Granted => {
                // Granted implies an effective role.
                let Some(role) = session.effective_role() else {
                    return Navigation::Redirect { to: guard::LANDING_PATH, reason: DenyReason::Unauthenticated };
                };
                Navigation::Render { view: route.view, layout: Layout::for_role(role), nav: nav::entries_for(Some(role)) }
            }
        },
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
