//! `reqwest` implementation of [`BackendApi`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::BackendApi;
use super::types::{
    ActivationRequest, ActivationRequestPage, ActivationSubmission, ApprovalStatus, ApproveReportBody,
    BankCredentials, CribAccount, CribAccountPage, CribCredentials, LoginResponse, ReportQuery, ReportRequest,
    ReportRequestPage, StatusResponse,
};
use crate::config::PortalConfig;
use crate::error::ApiError;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpBackend {
    http: reqwest::Client,
    config: PortalConfig,
}

impl HttpBackend {
    /// Build a client with the configured request/connect timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ClientBuild` if the TLS/HTTP stack cannot initialize.
    pub fn new(config: &PortalConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, config: config.clone() })
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    async fn login<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<LoginResponse, ApiError> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_server_error() {
            return Err(backend_error(response).await);
        }
        if !status.is_success() {
            return Err(ApiError::AuthRejected { status: status.as_u16() });
        }
        let login: LoginResponse = decode(response).await?;
        if login.token.is_empty() {
            return Err(ApiError::Decode("login response carried no token".to_owned()));
        }
        Ok(login)
    }

    async fn register<B: serde::Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self.http.post(self.url(path)).json(body).send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }
        Ok(())
    }
}

// =============================================================================
// RESPONSE HANDLING
// =============================================================================

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::NetworkFailure(e.to_string())
}

async fn backend_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::Backend { status, body }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let text = response.text().await.map_err(transport)?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Status handling shared by bearer-authenticated calls.
async fn check_authed(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(ApiError::StaleSession),
        status if status.is_success() => Ok(response),
        _ => Err(backend_error(response).await),
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn bank_login(&self, creds: &BankCredentials) -> Result<LoginResponse, ApiError> {
        self.login("bank/login", creds, None).await
    }

    async fn signer_login(&self, token: &str, creds: &BankCredentials) -> Result<LoginResponse, ApiError> {
        self.login("bank/login", creds, Some(token)).await
    }

    async fn crib_login(&self, creds: &CribCredentials) -> Result<LoginResponse, ApiError> {
        self.login("crib/login", creds, None).await
    }

    async fn register_bank(&self, creds: &BankCredentials) -> Result<(), ApiError> {
        self.register("bank", creds).await
    }

    async fn register_crib(&self, creds: &CribCredentials) -> Result<(), ApiError> {
        self.register("crib", creds).await
    }

    async fn approval_status(&self, token: &str, bank_id: &str, bank_name: &str) -> Result<ApprovalStatus, ApiError> {
        let response = self
            .http
            .get(self.url("bank/get/status"))
            .query(&[("bankId", bank_id), ("bankName", bank_name)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ApprovalStatus::NotRequested);
        }
        let body: StatusResponse = decode(check_authed(response).await?).await?;
        Ok(ApprovalStatus::from_backend(&body.status))
    }

    async fn request_activation(
        &self,
        token: &str,
        bank_id: &str,
        bank_name: &str,
        license_number: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("bank/add/to/chain/request"))
            .bearer_auth(token)
            .json(&ActivationSubmission { bank_name, bank_id, license_number })
            .send()
            .await
            .map_err(transport)?;
        check_authed(response).await?;
        Ok(())
    }

    async fn activation_requests(&self, token: &str, status: &str) -> Result<Vec<ActivationRequest>, ApiError> {
        let response = self
            .http
            .get(self.url("crib/onchain/requests"))
            .query(&[("status", status)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        let page: ActivationRequestPage = decode(check_authed(response).await?).await?;
        Ok(page.requests)
    }

    async fn crib_accounts(&self, token: &str, bank_id: &str, bank_name: &str) -> Result<Vec<CribAccount>, ApiError> {
        let response = self
            .http
            .get(self.url("bank/get/all/cribs"))
            .query(&[("bankId", bank_id), ("bankName", bank_name)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        let page: CribAccountPage = decode(check_authed(response).await?).await?;
        Ok(page.accounts.unwrap_or_default())
    }

    async fn report_requests(&self, token: &str, query: &ReportQuery) -> Result<Vec<ReportRequest>, ApiError> {
        let limit = query.limit.to_string();
        let offset = query.offset.to_string();
        let response = self
            .http
            .get(self.url("crib/report/requests"))
            .query(&[("status", query.status.as_str()), ("limit", limit.as_str()), ("offset", offset.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        let page: ReportRequestPage = decode(check_authed(response).await?).await?;
        Ok(page.rows)
    }

    async fn approve_report(&self, token: &str, request_id: &str, nic: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("crib/approve/report"))
            .bearer_auth(token)
            .json(&ApproveReportBody { request_id, nic })
            .send()
            .await
            .map_err(transport)?;
        check_authed(response).await?;
        Ok(())
    }
}
