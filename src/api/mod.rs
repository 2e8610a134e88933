//! REST backend access.
//!
//! DESIGN
//! ======
//! Callers depend on the `BackendApi` trait, not on HTTP. `HttpBackend` is
//! the production implementation; tests substitute in-memory fakes so login
//! sequencing can be exercised without a server.
//!
//! ERROR HANDLING
//! ==============
//! Every method returns `ApiError`. Transport problems become
//! `NetworkFailure`, a refused login becomes `AuthRejected`, and a 401 on a
//! bearer-authenticated call becomes `StaleSession`.

pub mod http;
pub mod types;

use async_trait::async_trait;

pub use http::HttpBackend;
pub use types::{
    ActivationRequest, ApprovalStatus, BankCredentials, CribAccount, CribCredentials, LoginResponse, ReportQuery,
    ReportRequest,
};

use crate::error::ApiError;

#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `POST bank/login`.
    async fn bank_login(&self, creds: &BankCredentials) -> Result<LoginResponse, ApiError>;

    /// `POST bank/login` on behalf of a logged-in CRIB member, to fetch the
    /// signer bank's wallet secret. Sends the member's token as bearer.
    async fn signer_login(&self, token: &str, creds: &BankCredentials) -> Result<LoginResponse, ApiError>;

    /// `POST crib/login`.
    async fn crib_login(&self, creds: &CribCredentials) -> Result<LoginResponse, ApiError>;

    /// `POST bank`.
    async fn register_bank(&self, creds: &BankCredentials) -> Result<(), ApiError>;

    /// `POST crib`.
    async fn register_crib(&self, creds: &CribCredentials) -> Result<(), ApiError>;

    /// `GET bank/get/status`. A 404 means the bank never requested activation.
    async fn approval_status(&self, token: &str, bank_id: &str, bank_name: &str) -> Result<ApprovalStatus, ApiError>;

    /// `POST bank/add/to/chain/request`: ask CRIB to activate this bank.
    async fn request_activation(
        &self,
        token: &str,
        bank_id: &str,
        bank_name: &str,
        license_number: &str,
    ) -> Result<(), ApiError>;

    /// `GET crib/onchain/requests`.
    async fn activation_requests(&self, token: &str, status: &str) -> Result<Vec<ActivationRequest>, ApiError>;

    /// `GET bank/get/all/cribs`.
    async fn crib_accounts(&self, token: &str, bank_id: &str, bank_name: &str) -> Result<Vec<CribAccount>, ApiError>;

    /// `GET crib/report/requests`.
    async fn report_requests(&self, token: &str, query: &ReportQuery) -> Result<Vec<ReportRequest>, ApiError>;

    /// `POST crib/approve/report`.
    async fn approve_report(&self, token: &str, request_id: &str, nic: &str) -> Result<(), ApiError>;
}
