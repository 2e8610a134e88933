use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::Instrument;
use uuid::Uuid;

use crate::api::{ApprovalStatus, BackendApi, BankCredentials, CribCredentials, LoginResponse};
use crate::config::{DependentFailure, PortalConfig, SignerBank};
use crate::error::{ApiError, PortalError};
use crate::session::{Role, Session, SessionStore, WalletSecret};

/// Result of a committed login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginOutcome {
    pub sequence: u64,
    pub role: Role,
    pub approval: ApprovalStatus,
    /// Path to open after the login completes.
    pub landing: &'static str,
    pub wallet_attached: bool,
}

/// Where a freshly logged-in principal lands.
#[must_use]
pub fn landing_for(role: Role, approval: ApprovalStatus) -> &'static str {
    match (role, approval) {
        (Role::Bank, ApprovalStatus::Approved) => "/accounts",
        (Role::Bank, _) => "/dashboard",
        (Role::CribMember, _) => "/crib-requests",
    }
}

/// Build the full session snapshot from a login response. A response without
/// a role gets the role of the portal that was logged into; a role this build
/// does not know is refused rather than guessed.
fn snapshot_from(response: LoginResponse, portal: Role) -> Result<Session, ApiError> {
    let role = match response.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        None => portal,
        Some(raw) => Role::parse(raw).ok_or_else(|| ApiError::Decode(format!("unrecognized role '{raw}'")))?,
    };
    Ok(Session {
        token: response.token,
        refresh_token: response.refresh_token,
        role: Some(role),
        organization_name: response.bank_name.unwrap_or_default(),
        organization_id: response.bank_id.unwrap_or_default(),
        username: response.username.unwrap_or_default(),
        wallet_secret: response.mnemonic.filter(|m| !m.is_empty()).map(WalletSecret::new),
    })
}

// =============================================================================
// COORDINATOR
// =============================================================================

pub struct LoginCoordinator {
    backend: Arc<dyn BackendApi>,
    store: SessionStore,
    latest: Arc<AtomicU64>,
    on_dependent_failure: DependentFailure,
    signer_bank: Option<SignerBank>,
}

impl LoginCoordinator {
    #[must_use]
    pub fn new(backend: Arc<dyn BackendApi>, store: SessionStore, config: &PortalConfig) -> Self {
        Self {
            backend,
            store,
            latest: Arc::new(AtomicU64::new(0)),
            on_dependent_failure: config.on_dependent_failure,
            signer_bank: config.signer_bank.clone(),
        }
    }

    /// Sequence number of the most recently issued attempt (or cancel).
    #[must_use]
    pub fn latest_sequence(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Invalidate every in-flight login; their completions will be dropped.
    pub fn cancel_pending(&self) {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(sequence, "pending logins cancelled");
    }

    /// Cancel in-flight logins and clear the session.
    pub fn logout(&self) {
        self.cancel_pending();
        self.store.clear_session();
    }

    /// Log into the bank portal and look up the bank's activation status.
    ///
    /// # Errors
    ///
    /// `Api` when the backend refuses or cannot be reached, `Superseded` when
    /// a newer attempt started first. The session is untouched on error.
    pub async fn login_bank(&self, creds: &BankCredentials) -> Result<LoginOutcome, PortalError> {
        let sequence = self.begin();
        let span = tracing::info_span!("login", portal = "bank", attempt = %Uuid::new_v4(), sequence);
        self.bank_flow(sequence, creds).instrument(span).await
    }

    /// Log into the CRIB member portal, attaching the signer bank's wallet
    /// secret when one is configured.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login_bank`].
    pub async fn login_crib(&self, creds: &CribCredentials) -> Result<LoginOutcome, PortalError> {
        let sequence = self.begin();
        let span = tracing::info_span!("login", portal = "crib", attempt = %Uuid::new_v4(), sequence);
        self.crib_flow(sequence, creds).instrument(span).await
    }

    fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_current(&self, sequence: u64) -> Result<(), PortalError> {
        if self.latest.load(Ordering::SeqCst) == sequence {
            Ok(())
        } else {
            tracing::info!("login superseded before commit");
            Err(PortalError::Superseded { sequence })
        }
    }

    async fn bank_flow(&self, sequence: u64, creds: &BankCredentials) -> Result<LoginOutcome, PortalError> {
        let response = self.backend.bank_login(creds).await.inspect_err(|e| {
            tracing::warn!(error = %e, "bank login failed");
        })?;
        self.ensure_current(sequence)?;

        let snapshot = snapshot_from(response, Role::Bank).inspect_err(|e| {
            tracing::warn!(error = %e, "bank login response refused");
        })?;
        let approval = match self.fetch_approval(&snapshot).await {
            Ok(status) => status,
            Err(e) => {
                self.dependent_failed("approval status", e)?;
                ApprovalStatus::NotRequested
            }
        };

        self.commit(sequence, snapshot, approval)
    }

    async fn crib_flow(&self, sequence: u64, creds: &CribCredentials) -> Result<LoginOutcome, PortalError> {
        let response = self.backend.crib_login(creds).await.inspect_err(|e| {
            tracing::warn!(error = %e, "crib login failed");
        })?;
        self.ensure_current(sequence)?;

        let mut snapshot = snapshot_from(response, Role::CribMember).inspect_err(|e| {
            tracing::warn!(error = %e, "crib login response refused");
        })?;
        if let Some(signer) = &self.signer_bank {
            let token = snapshot.token.clone();
            match self.fetch_signer_wallet(&token, signer).await {
                Ok(Some(secret)) => snapshot.wallet_secret = Some(secret),
                Ok(None) => tracing::warn!(bank = %signer.bank_name, "signer bank returned no wallet secret"),
                Err(e) => self.dependent_failed("signer wallet", e)?,
            }
        }

        self.commit(sequence, snapshot, ApprovalStatus::NotChecked)
    }

    async fn fetch_approval(&self, snapshot: &Session) -> Result<ApprovalStatus, ApiError> {
        if snapshot.role != Some(Role::Bank) {
            return Ok(ApprovalStatus::NotChecked);
        }
        if snapshot.organization_name.is_empty() {
            return Ok(ApprovalStatus::NotRequested);
        }
        self.backend
            .approval_status(&snapshot.token, &snapshot.organization_id, &snapshot.organization_name)
            .await
    }

    async fn fetch_signer_wallet(&self, token: &str, signer: &SignerBank) -> Result<Option<WalletSecret>, ApiError> {
        let creds = BankCredentials { bank_name: signer.bank_name.clone(), password: signer.password.clone() };
        let response = self.backend.signer_login(token, &creds).await?;
        Ok(response.mnemonic.filter(|m| !m.is_empty()).map(WalletSecret::new))
    }

    fn dependent_failed(&self, call: &'static str, error: ApiError) -> Result<(), PortalError> {
        match self.on_dependent_failure {
            DependentFailure::Keep => {
                tracing::warn!(call, error = %error, "dependent call failed, keeping primary login");
                Ok(())
            }
            DependentFailure::Rollback => {
                tracing::warn!(call, error = %error, "dependent call failed, rolling back login");
                Err(error.into())
            }
        }
    }

    fn commit(&self, sequence: u64, mut snapshot: Session, approval: ApprovalStatus) -> Result<LoginOutcome, PortalError> {
        let prior = self.store.get_session();
        if prior.same_principal(&snapshot) {
            if let Some(existing) = prior.wallet_secret {
                if snapshot.wallet_secret.as_ref().is_some_and(|fresh| *fresh != existing) {
                    tracing::warn!("backend sent a different wallet secret for this account, keeping the stored one");
                }
                snapshot.wallet_secret = Some(existing);
            }
        }

        let role = snapshot.role.unwrap_or(Role::Bank);
        let wallet_attached = snapshot.wallet_secret.is_some();
        let principal = snapshot.principal_label();

        let latest = Arc::clone(&self.latest);
        if !self.store.set_session_if(snapshot, move || latest.load(Ordering::SeqCst) == sequence) {
            tracing::info!("login superseded at commit");
            return Err(PortalError::Superseded { sequence });
        }

        tracing::info!(%principal, %approval, wallet_attached, "login committed");
        Ok(LoginOutcome { sequence, role, approval, landing: landing_for(role, approval), wallet_attached })
    }
}

#[cfg(test)]
#[path = "login_test.rs"]
mod tests;
