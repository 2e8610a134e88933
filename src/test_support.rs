//! In-memory backend fake shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{
    ActivationRequest, ApprovalStatus, BackendApi, BankCredentials, CribAccount, CribCredentials, LoginResponse, ReportQuery,
    ReportRequest,
};
use crate::error::ApiError;

/// Failure the fake can be told to return. `ApiError` is not `Clone`, so
/// scripted failures are stored in this form.
#[derive(Clone, Copy, Debug)]
pub enum Fail {
    Rejected,
    Network,
    Stale,
}

impl Fail {
    fn to_error(self) -> ApiError {
        match self {
            Self::Rejected => ApiError::AuthRejected { status: 401 },
            Self::Network => ApiError::NetworkFailure("connection refused".into()),
            Self::Stale => ApiError::StaleSession,
        }
    }
}

type Scripted<T> = Result<T, Fail>;

#[derive(Default)]
pub struct FakeBackend {
    bank_logins: Mutex<HashMap<String, Scripted<LoginResponse>>>,
    crib_logins: Mutex<HashMap<String, Scripted<LoginResponse>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    status: Mutex<Option<Scripted<ApprovalStatus>>>,
    reports: Mutex<Option<Scripted<Vec<ReportRequest>>>>,
    activations: Mutex<Option<Scripted<Vec<ActivationRequest>>>>,
    accounts: Mutex<Option<Scripted<Vec<CribAccount>>>>,
    calls: Mutex<Vec<String>>,
}

pub fn login_response(token: &str, org: &str, mnemonic: Option<&str>) -> LoginResponse {
    LoginResponse {
        token: token.into(),
        refresh_token: format!("{token}-refresh"),
        role: None,
        bank_name: Some(org.into()),
        bank_id: Some(format!("{org}-id")),
        username: Some("user".into()),
        mnemonic: mnemonic.map(str::to_owned),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn bank_login_returns(&self, bank_name: &str, result: Scripted<LoginResponse>) {
        lock(&self.bank_logins).insert(bank_name.into(), result);
    }

    pub fn crib_login_returns(&self, user_name: &str, result: Scripted<LoginResponse>) {
        lock(&self.crib_logins).insert(user_name.into(), result);
    }

    pub fn status_returns(&self, result: Scripted<ApprovalStatus>) {
        *lock(&self.status) = Some(result);
    }

    pub fn reports_return(&self, result: Scripted<Vec<ReportRequest>>) {
        *lock(&self.reports) = Some(result);
    }

    pub fn activations_return(&self, result: Scripted<Vec<ActivationRequest>>) {
        *lock(&self.activations) = Some(result);
    }

    pub fn accounts_return(&self, result: Scripted<Vec<CribAccount>>) {
        *lock(&self.accounts) = Some(result);
    }

    /// Hold logins for `name` (or `report_requests` calls, under that name) until the returned notify fires.
    pub fn gate(&self, name: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        lock(&self.gates).insert(name.into(), notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }

    async fn wait_gate(&self, name: &str) {
        let gate = lock(&self.gates).get(name).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn bank_login(&self, creds: &BankCredentials) -> Result<LoginResponse, ApiError> {
        self.record(format!("bank_login:{}", creds.bank_name));
        self.wait_gate(&creds.bank_name).await;
        let scripted = lock(&self.bank_logins).get(&creds.bank_name).cloned();
        scripted.unwrap_or(Err(Fail::Rejected)).map_err(Fail::to_error)
    }

    async fn signer_login(&self, token: &str, creds: &BankCredentials) -> Result<LoginResponse, ApiError> {
        self.record(format!("signer_login:{}:{token}", creds.bank_name));
        let scripted = lock(&self.bank_logins).get(&creds.bank_name).cloned();
        scripted.unwrap_or(Err(Fail::Rejected)).map_err(Fail::to_error)
    }

    async fn crib_login(&self, creds: &CribCredentials) -> Result<LoginResponse, ApiError> {
        self.record(format!("crib_login:{}", creds.user_name));
        self.wait_gate(&creds.user_name).await;
        let scripted = lock(&self.crib_logins).get(&creds.user_name).cloned();
        scripted.unwrap_or(Err(Fail::Rejected)).map_err(Fail::to_error)
    }

    async fn register_bank(&self, creds: &BankCredentials) -> Result<(), ApiError> {
        self.record(format!("register_bank:{}", creds.bank_name));
        Ok(())
    }

    async fn register_crib(&self, creds: &CribCredentials) -> Result<(), ApiError> {
        self.record(format!("register_crib:{}", creds.user_name));
        Ok(())
    }

    async fn approval_status(&self, token: &str, _bank_id: &str, bank_name: &str) -> Result<ApprovalStatus, ApiError> {
        self.record(format!("approval_status:{bank_name}:{token}"));
        let scripted = *lock(&self.status);
        scripted.unwrap_or(Ok(ApprovalStatus::NotRequested)).map_err(Fail::to_error)
    }

    async fn request_activation(
        &self,
        token: &str,
        bank_id: &str,
        bank_name: &str,
        license_number: &str,
    ) -> Result<(), ApiError> {
        self.record(format!("request_activation:{bank_name}:{bank_id}:{license_number}:{token}"));
        Ok(())
    }

    async fn activation_requests(&self, token: &str, status: &str) -> Result<Vec<ActivationRequest>, ApiError> {
        self.record(format!("activation_requests:{status}:{token}"));
        let scripted = lock(&self.activations).clone();
        scripted.unwrap_or(Ok(Vec::new())).map_err(Fail::to_error)
    }

    async fn crib_accounts(&self, token: &str, bank_id: &str, bank_name: &str) -> Result<Vec<CribAccount>, ApiError> {
        self.record(format!("crib_accounts:{bank_name}:{bank_id}:{token}"));
        let scripted = lock(&self.accounts).clone();
        scripted.unwrap_or(Ok(Vec::new())).map_err(Fail::to_error)
    }

    async fn report_requests(&self, token: &str, query: &ReportQuery) -> Result<Vec<ReportRequest>, ApiError> {
        self.record(format!("report_requests:{}:{token}", query.status));
        self.wait_gate("report_requests").await;
        let scripted = lock(&self.reports).clone();
        scripted.unwrap_or(Ok(Vec::new())).map_err(Fail::to_error)
    }

    async fn approve_report(&self, token: &str, request_id: &str, nic: &str) -> Result<(), ApiError> {
        self.record(format!("approve_report:{request_id}:{nic}:{token}"));
        Ok(())
    }
}
