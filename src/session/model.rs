use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ROLE
// =============================================================================

/// Coarse permission class deciding which view groups are reachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "bank")]
    Bank,
    #[serde(rename = "crib")]
    CribMember,
}

impl Role {
    /// Wire/storage spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::CribMember => "crib",
        }
    }

    /// Parse the backend's role string. Unknown strings are not a role.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bank" => Some(Self::Bank),
            "crib" => Some(Self::CribMember),
            _ => None,
        }
    }

    /// Entry point for an unauthenticated user who last held this role.
    #[must_use]
    pub fn login_path(self) -> &'static str {
        match self {
            Self::Bank => "/bank-login",
            Self::CribMember => "/crib-login",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored role strings the current build does not know read back as `None`
/// instead of failing the whole snapshot.
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Role::parse))
}

// =============================================================================
// WALLET SECRET
// =============================================================================

/// Recovery phrase handed to the signing library. Opaque to this crate and
/// never rendered by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletSecret(String);

impl WalletSecret {
    #[must_use]
    pub fn new(phrase: impl Into<String>) -> Self {
        Self(phrase.into())
    }

    /// Raw phrase, for the signing library only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for WalletSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WalletSecret(<redacted>)")
    }
}

impl fmt::Display for WalletSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Snapshot of the authenticated principal and its credentials.
///
/// The default value is the empty, unauthenticated session.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    /// Bearer credential; empty means unauthenticated.
    pub token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "lenient_role")]
    pub role: Option<Role>,
    pub organization_name: String,
    pub organization_id: String,
    pub username: String,
    pub wallet_secret: Option<WalletSecret>,
}

/// Tokens and the wallet secret never reach `Debug` output; only whether
/// they are present does.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("has_token", &!self.token.is_empty())
            .field("has_refresh_token", &!self.refresh_token.is_empty())
            .field("role", &self.role)
            .field("organization_name", &self.organization_name)
            .field("organization_id", &self.organization_id)
            .field("username", &self.username)
            .field("wallet_secret", &self.wallet_secret)
            .finish()
    }
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    /// Role that counts for authorization: absent whenever the token is.
    #[must_use]
    pub fn effective_role(&self) -> Option<Role> {
        if self.is_authenticated() { self.role } else { None }
    }

    /// Whether `other` describes the same account (role + organization + user).
    #[must_use]
    pub fn same_principal(&self, other: &Session) -> bool {
        self.role.is_some()
            && self.role == other.role
            && self.organization_id == other.organization_id
            && self.organization_name == other.organization_name
            && self.username == other.username
    }

    /// Short human label, e.g. `bank:BOC/alice`.
    #[must_use]
    pub fn principal_label(&self) -> String {
        match self.effective_role() {
            None => "anonymous".to_owned(),
            Some(role) if self.username.is_empty() => format!("{role}:{}", self.organization_name),
            Some(role) => format!("{role}:{}/{}", self.organization_name, self.username),
        }
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
