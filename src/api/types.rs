//! Wire types for the CRIB backend REST API.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Bank portal credentials, used for both login and registration.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankCredentials {
    pub bank_name: String,
    pub password: String,
}

/// CRIB member credentials, used for both login and registration.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CribCredentials {
    pub user_name: String,
    pub password: String,
}

impl fmt::Debug for BankCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankCredentials").field("bank_name", &self.bank_name).finish_non_exhaustive()
    }
}

impl fmt::Debug for CribCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CribCredentials").field("user_name", &self.user_name).finish_non_exhaustive()
    }
}

// =============================================================================
// LOGIN
// =============================================================================

/// Body of a successful `bank/login` or `crib/login`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub role: Option<String>,
    pub bank_name: Option<String>,
    pub bank_id: Option<String>,
    pub username: Option<String>,
    pub mnemonic: Option<String>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("role", &self.role)
            .field("bank_name", &self.bank_name)
            .field("bank_id", &self.bank_id)
            .field("username", &self.username)
            .field("has_mnemonic", &self.mnemonic.as_deref().is_some_and(|m| !m.is_empty()))
            .finish_non_exhaustive()
    }
}

// =============================================================================
// APPROVAL STATUS
// =============================================================================

/// On-chain activation state of a bank account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// No status call has been made.
    #[default]
    NotChecked,
    Pending,
    Approved,
    Rejected,
    NotRequested,
}

impl ApprovalStatus {
    /// Map the backend's free-form status string.
    #[must_use]
    pub fn from_backend(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "rejected" => Self::Rejected,
            _ => Self::NotRequested,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotChecked => "not_checked",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NotRequested => "not_requested",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub status: String,
}

fn backend_status<'de, D>(deserializer: D) -> Result<ApprovalStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map_or(ApprovalStatus::NotChecked, ApprovalStatus::from_backend))
}

// =============================================================================
// ACTIVATION REQUESTS
// =============================================================================

/// A bank asking to be added to the CRIB network, as listed to CRIB members.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivationRequest {
    pub bank_name: String,
    pub bank_id: String,
    pub license_number: String,
    #[serde(deserialize_with = "backend_status")]
    pub status: ApprovalStatus,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivationRequestPage {
    #[serde(default)]
    pub requests: Vec<ActivationRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActivationSubmission<'a> {
    pub bank_name: &'a str,
    pub bank_id: &'a str,
    pub license_number: &'a str,
}

// =============================================================================
// CRIB ACCOUNTS
// =============================================================================

/// Customer account a bank registered on the CRIB network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CribAccount {
    pub nic: String,
    pub crib_id: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub is_active: bool,
    pub phone_number: String,
    pub email: String,
    pub nic_front_cid: String,
    pub nic_back_cid: String,
    pub created_by: String,
    pub created_at: String,
    pub creator: String,
}

/// `cribAccount` may be absent or `null` when the bank has none.
#[derive(Debug, Deserialize)]
pub(crate) struct CribAccountPage {
    #[serde(default, rename = "cribAccount")]
    pub accounts: Option<Vec<CribAccount>>,
}

// =============================================================================
// REPORT REQUESTS
// =============================================================================

/// A customer's request for their credit report, awaiting CRIB approval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub nic: String,
    #[serde(default)]
    pub email: String,
    /// `true` once approved.
    #[serde(default)]
    pub status: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportQuery {
    pub status: String,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self { status: "Pending".to_owned(), limit: 10, offset: 0 }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportRequestPage {
    #[serde(default)]
    pub rows: Vec<ReportRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApproveReportBody<'a> {
    pub request_id: &'a str,
    pub nic: &'a str,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
