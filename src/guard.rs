//! Route guard: may the current session open a role-scoped view group?
//!
//! The check is a pure function of the allowed roles and the session it is
//! handed. It keeps no state, so callers evaluate it on every navigation.

use crate::session::{Role, Session};

/// Generic landing page for visitors with no known role.
pub const LANDING_PATH: &str = "/";
/// View shown to authenticated users lacking the required role.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// No token; the user has to log in.
    Unauthenticated,
    /// Token present but the role is missing or not allowed.
    Unauthorized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Granted,
    Denied { redirect: &'static str, reason: DenyReason },
}

impl GuardDecision {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Decide whether `session` may render a view group open to `allowed`.
///
/// 1. Empty token: redirect to the login page of the last known role, or to
///    the landing page when no role is known.
/// 2. Missing role, or role not in `allowed`: redirect to the unauthorized view.
/// 3. Otherwise granted.
#[must_use]
pub fn check(allowed: &[Role], session: &Session) -> GuardDecision {
    if !session.is_authenticated() {
        let redirect = session.role.map_or(LANDING_PATH, Role::login_path);
        return GuardDecision::Denied { redirect, reason: DenyReason::Unauthenticated };
    }

    match session.role {
        Some(role) if allowed.contains(&role) => GuardDecision::Granted,
        _ => GuardDecision::Denied { redirect: UNAUTHORIZED_PATH, reason: DenyReason::Unauthorized },
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
