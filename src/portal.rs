//! Portal context: the object a front end holds instead of global state.
//!
//! DESIGN
//! ======
//! `Portal` bundles the config, the session store, the backend and the login
//! coordinator. Views ask it where a path leads (`navigate`), and every
//! backend call that needs a bearer token goes through `authorized`, which
//! reads the token from the current session at call time.
//!
//! A stale-token response clears the session only when
//! `PortalConfig::clear_on_stale` is set, and only if the rejected token is
//! still the current one. A late 401 for a token that a re-login already
//! replaced changes nothing.

use std::sync::Arc;

use crate::api::{
    ActivationRequest, ApprovalStatus, BackendApi, BankCredentials, CribAccount, CribCredentials, HttpBackend, ReportQuery,
    ReportRequest,
};
use crate::auth::{LoginCoordinator, LoginOutcome};
use crate::config::PortalConfig;
use crate::dispatch::{self, Navigation};
use crate::error::{ApiError, PortalError};
use crate::nav::{self, NavEntry};
use crate::session::{FileStorage, Role, Session, SessionStorage, SessionStore, WalletSecret};

/// What the external signing library needs to sign and broadcast.
#[derive(Debug, Clone)]
pub struct SigningMaterial {
    pub rpc_endpoint: String,
    pub wallet_secret: WalletSecret,
}

pub struct Portal {
    config: PortalConfig,
    store: SessionStore,
    backend: Arc<dyn BackendApi>,
    logins: LoginCoordinator,
}

impl Portal {
    /// Portal backed by the session file and HTTP backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Api` if the HTTP client cannot be built.
    pub fn open(config: PortalConfig) -> Result<Self, PortalError> {
        let storage = Arc::new(FileStorage::new(&config.session_file, config.session_namespace.clone()));
        let backend = Arc::new(HttpBackend::new(&config)?);
        Ok(Self::with_parts(config, storage, backend))
    }

    /// Portal over caller-supplied storage and backend.
    #[must_use]
    pub fn with_parts(config: PortalConfig, storage: Arc<dyn SessionStorage>, backend: Arc<dyn BackendApi>) -> Self {
        let store = SessionStore::open(storage);
        let logins = LoginCoordinator::new(backend.clone(), store.clone(), &config);
        Self { config, store, backend, logins }
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Shared handle to the session, for subscribers.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.store.get_session()
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Where `path` leads for the session as it is right now.
    #[must_use]
    pub fn navigate(&self, path: &str) -> Navigation {
        let outcome = dispatch::navigate(path, &self.store.get_session());
        tracing::debug!(path, ?outcome, "navigate");
        outcome
    }

    /// Sidebar entries for the current session.
    #[must_use]
    pub fn nav_entries(&self) -> Vec<&'static NavEntry> {
        nav::entries_for(self.store.get_session().effective_role())
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// # Errors
    ///
    /// See [`LoginCoordinator::login_bank`].
    pub async fn login_bank(&self, creds: &BankCredentials) -> Result<LoginOutcome, PortalError> {
        self.logins.login_bank(creds).await
    }

    /// # Errors
    ///
    /// See [`LoginCoordinator::login_crib`].
    pub async fn login_crib(&self, creds: &CribCredentials) -> Result<LoginOutcome, PortalError> {
        self.logins.login_crib(creds).await
    }

    /// Drop any login still in flight, e.g. when the user leaves the login page.
    pub fn cancel_pending_login(&self) {
        self.logins.cancel_pending();
    }

    pub fn logout(&self) {
        self.logins.logout();
    }

    /// Register a bank account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Api` when the backend refuses or is unreachable.
    pub async fn register_bank(&self, creds: &BankCredentials) -> Result<(), PortalError> {
        self.backend.register_bank(creds).await?;
        tracing::info!(bank = %creds.bank_name, "bank registered");
        Ok(())
    }

    /// Register a CRIB member account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::Api` when the backend refuses or is unreachable.
    pub async fn register_crib(&self, creds: &CribCredentials) -> Result<(), PortalError> {
        self.backend.register_crib(creds).await?;
        tracing::info!(user = %creds.user_name, "crib member registered");
        Ok(())
    }

    // =========================================================================
    // AUTHENTICATED CALLS
    // =========================================================================

    /// Current session, provided it is logged in with `role`.
    fn authorized(&self, role: Role) -> Result<Session, PortalError> {
        let session = self.store.get_session();
        match session.effective_role() {
            None => Err(PortalError::NotAuthenticated),
            Some(current) if current == role => Ok(session),
            Some(_) => Err(PortalError::WrongRole { required: role }),
        }
    }

    /// `token` is the one the failed call carried.
    fn api_failure(&self, token: &str, error: ApiError) -> PortalError {
        if error.is_stale_session() {
            if !self.config.clear_on_stale {
                tracing::warn!("backend rejected session token");
            } else if self.store.clear_session_if(|current| current.token == token) {
                tracing::warn!("backend rejected session token, session cleared");
            } else {
                tracing::info!("backend rejected a token that is no longer current, session kept");
            }
        }
        PortalError::Api(error)
    }

    /// Activation status of the logged-in bank.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated`/`WrongRole` without a bank session, `Api` on
    /// backend failure.
    pub async fn approval_status(&self) -> Result<ApprovalStatus, PortalError> {
        let session = self.authorized(Role::Bank)?;
        if session.organization_name.is_empty() {
            return Ok(ApprovalStatus::NotRequested);
        }
        self.backend
            .approval_status(&session.token, &session.organization_id, &session.organization_name)
            .await
            .map_err(|e| self.api_failure(&session.token, e))
    }

    /// Ask CRIB to add the logged-in bank to the network. Returns the status
    /// the bank is in afterwards.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank license number or a session without the
    /// bank's identity, otherwise as [`Self::approval_status`].
    pub async fn request_activation(&self, license_number: &str) -> Result<ApprovalStatus, PortalError> {
        let session = self.authorized(Role::Bank)?;
        let license_number = license_number.trim();
        if license_number.is_empty() {
            return Err(PortalError::InvalidInput("license number is required"));
        }
        if session.organization_id.is_empty() || session.organization_name.is_empty() {
            return Err(PortalError::InvalidInput("session has no bank identity"));
        }
        self.backend
            .request_activation(&session.token, &session.organization_id, &session.organization_name, license_number)
            .await
            .map_err(|e| self.api_failure(&session.token, e))?;
        tracing::info!(bank = %session.organization_name, "activation requested");
        Ok(ApprovalStatus::Pending)
    }

    /// Customer CRIB accounts registered by the logged-in bank.
    ///
    /// # Errors
    ///
    /// Same as [`Self::approval_status`].
    pub async fn crib_accounts(&self) -> Result<Vec<CribAccount>, PortalError> {
        let session = self.authorized(Role::Bank)?;
        self.backend
            .crib_accounts(&session.token, &session.organization_id, &session.organization_name)
            .await
            .map_err(|e| self.api_failure(&session.token, e))
    }

    /// Bank activation requests with the given status (`pending`,
    /// `approved`, `rejected`).
    ///
    /// # Errors
    ///
    /// `NotAuthenticated`/`WrongRole` without a CRIB session, `Api` on
    /// backend failure.
    pub async fn activation_requests(&self, status: &str) -> Result<Vec<ActivationRequest>, PortalError> {
        let session = self.authorized(Role::CribMember)?;
        self.backend
            .activation_requests(&session.token, status)
            .await
            .map_err(|e| self.api_failure(&session.token, e))
    }

    /// Customer report requests awaiting a CRIB member.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated`/`WrongRole` without a CRIB session, `Api` on
    /// backend failure.
    pub async fn report_requests(&self, query: &ReportQuery) -> Result<Vec<ReportRequest>, PortalError> {
        let session = self.authorized(Role::CribMember)?;
        self.backend
            .report_requests(&session.token, query)
            .await
            .map_err(|e| self.api_failure(&session.token, e))
    }

    /// Approve a customer's report request.
    ///
    /// # Errors
    ///
    /// Same as [`Self::report_requests`].
    pub async fn approve_report(&self, request_id: &str, nic: &str) -> Result<(), PortalError> {
        let session = self.authorized(Role::CribMember)?;
        self.backend
            .approve_report(&session.token, request_id, nic)
            .await
            .map_err(|e| self.api_failure(&session.token, e))?;
        tracing::info!(request_id, "report approved");
        Ok(())
    }

    /// Inputs for the signing library, if this session can sign.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` when logged out, `SigningUnavailable` when the
    /// RPC endpoint or wallet secret is missing.
    pub fn signing_material(&self) -> Result<SigningMaterial, PortalError> {
        let session = self.store.get_session();
        if !session.is_authenticated() {
            return Err(PortalError::NotAuthenticated);
        }
        let rpc_endpoint = self
            .config
            .rpc_endpoint
            .clone()
            .ok_or(PortalError::SigningUnavailable("no RPC endpoint configured"))?;
        let wallet_secret = session
            .wallet_secret
            .ok_or(PortalError::SigningUnavailable("session holds no wallet secret"))?;
        Ok(SigningMaterial { rpc_endpoint, wallet_secret })
    }
}

#[cfg(test)]
#[path = "portal_test.rs"]
mod tests;
