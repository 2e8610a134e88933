//! `HttpBackend` and `Portal` against a fake CRIB backend served by axum.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use crib_portal::api::{ApprovalStatus, BackendApi, BankCredentials, CribCredentials, HttpBackend, ReportQuery};
use crib_portal::config::PortalConfig;
use crib_portal::dispatch::Navigation;
use crib_portal::error::{ApiError, PortalError};
use crib_portal::portal::Portal;
use crib_portal::session::Role;
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<String>>>,
}

impl Seen {
    fn push(&self, entry: String) {
        self.requests.lock().unwrap().push(entry);
    }

    fn all(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned()
}

async fn bank_login(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    seen.push(format!("bank_login:{}:{}", body["bankName"].as_str().unwrap_or(""), bearer(&headers)));
    match (body["bankName"].as_str(), body["password"].as_str()) {
        (Some("BOC"), Some("secret1")) => (
            StatusCode::OK,
            Json(json!({
                "token": "bank-token",
                "refreshToken": "bank-refresh",
                "bankName": "BOC",
                "bankId": "boc-1",
                "username": "boc-admin",
                "mnemonic": "twelve words of wallet seed"
            })),
        ),
        (Some("DOWN"), _) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "db offline" }))),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid credentials" }))),
    }
}

async fn crib_login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["userName"] == "carol" && body["password"] == "secret1" {
        (StatusCode::OK, Json(json!({ "token": "crib-token", "username": "carol" })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({})))
    }
}

async fn register(State(seen): State<Seen>, Json(body): Json<Value>) -> StatusCode {
    seen.push(format!("register:{body}"));
    if body["bankName"] == "TAKEN" { StatusCode::CONFLICT } else { StatusCode::CREATED }
}

async fn bank_status(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let auth = bearer(&headers);
    seen.push(format!("status:{auth}:{}:{}", params["bankId"], params["bankName"]));
    if auth != "Bearer bank-token" {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    match params["bankName"].as_str() {
        "BOC" => (StatusCode::OK, Json(json!({ "status": "Approved" }))),
        _ => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}

async fn report_requests(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let auth = bearer(&headers);
    seen.push(format!("reports:{}:{}:{}", params["status"], params["limit"], params["offset"]));
    if auth != "Bearer crib-token" {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "rows": [
                { "id": 7, "nic": "199012345678", "email": "a@example.test", "status": false },
                { "id": "8", "nic": "200011112222", "email": "b@example.test", "status": true }
            ]
        })),
    )
}

async fn approve_report(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    seen.push(format!("approve:{}:{body}", bearer(&headers)));
    StatusCode::OK
}

async fn request_activation(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    seen.push(format!("activate:{}:{body}", bearer(&headers)));
    if body["licenseNumber"] == "" {
        return StatusCode::BAD_REQUEST;
    }
    StatusCode::OK
}

async fn onchain_requests(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    seen.push(format!("onchain:{}:{}", bearer(&headers), params["status"]));
    (
        StatusCode::OK,
        Json(json!({
            "requests": [
                { "bankName": "HNB", "bankId": "hnb-1", "licenseNumber": "L-42", "status": "pending", "createdAt": "2025-03-01T10:00:00Z" }
            ]
        })),
    )
}

async fn crib_accounts(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    seen.push(format!("accounts:{}:{}:{}", bearer(&headers), params["bankId"], params["bankName"]));
    if params["bankName"] == "EMPTY" {
        return (StatusCode::OK, Json(json!({ "cribAccount": null })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "cribAccount": [
                { "nic": "199012345678", "cribId": "crib-9", "fullName": "Nimal Perera", "isActive": true, "email": "n@example.test" }
            ]
        })),
    )
}

async fn spawn_backend() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/api/bank/login", post(bank_login))
        .route("/api/crib/login", post(crib_login))
        .route("/api/bank", post(register))
        .route("/api/crib", post(register))
        .route("/api/bank/get/status", get(bank_status))
        .route("/api/crib/report/requests", get(report_requests))
        .route("/api/crib/approve/report", post(approve_report))
        .route("/api/bank/add/to/chain/request", post(request_activation))
        .route("/api/crib/onchain/requests", get(onchain_requests))
        .route("/api/bank/get/all/cribs", get(crib_accounts))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), seen)
}

fn bank_creds(bank_name: &str) -> BankCredentials {
    BankCredentials { bank_name: bank_name.into(), password: "secret1".into() }
}

// =============================================================================
// HttpBackend
// =============================================================================

#[tokio::test]
async fn bank_login_decodes_response() {
    let (url, _) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    let login = backend.bank_login(&bank_creds("BOC")).await.unwrap();

    assert_eq!(login.token, "bank-token");
    assert_eq!(login.refresh_token, "bank-refresh");
    assert_eq!(login.bank_id.as_deref(), Some("boc-1"));
    assert_eq!(login.mnemonic.as_deref(), Some("twelve words of wallet seed"));
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let (url, _) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    let err = backend
        .crib_login(&CribCredentials { user_name: "carol".into(), password: "wrong".into() })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::AuthRejected { status: 401 }));
}

#[tokio::test]
async fn server_error_on_login_is_not_a_rejection() {
    let (url, _) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    let err = backend.bank_login(&bank_creds("DOWN")).await.unwrap_err();

    assert!(matches!(err, ApiError::Backend { status: 500, .. }));
}

#[tokio::test]
async fn status_sends_bearer_and_bank_identity() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    let status = backend.approval_status("bank-token", "boc-1", "BOC").await.unwrap();
    let missing = backend.approval_status("bank-token", "x-1", "NEW BANK").await.unwrap();

    assert_eq!(status, ApprovalStatus::Approved);
    assert_eq!(missing, ApprovalStatus::NotRequested);
    assert_eq!(seen.all()[0], "status:Bearer bank-token:boc-1:BOC");
    assert_eq!(seen.all()[1], "status:Bearer bank-token:x-1:NEW BANK");
}

#[tokio::test]
async fn rejected_token_is_stale_session() {
    let (url, _) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    let err = backend.report_requests("expired", &ReportQuery::default()).await.unwrap_err();

    assert!(err.is_stale_session());
}

#[tokio::test]
async fn report_rows_accept_numeric_and_string_ids() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    let query = ReportQuery { status: "Pending".into(), limit: 5, offset: 10 };
    let rows = backend.report_requests("crib-token", &query).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "7");
    assert_eq!(rows[1].id, "8");
    assert!(rows[1].status);
    assert_eq!(seen.all(), ["reports:Pending:5:10"]);
}

#[tokio::test]
async fn approve_posts_request_id_and_nic() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    backend.approve_report("crib-token", "7", "199012345678").await.unwrap();

    let entry = &seen.all()[0];
    assert!(entry.starts_with("approve:Bearer crib-token:"));
    assert!(entry.contains(r#""requestId":"7""#));
    assert!(entry.contains(r#""nic":"199012345678""#));
}

#[tokio::test]
async fn register_conflict_is_backend_error() {
    let (url, _) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    backend.register_bank(&bank_creds("NEW BANK")).await.unwrap();
    let err = backend.register_bank(&bank_creds("TAKEN")).await.unwrap_err();

    assert!(matches!(err, ApiError::Backend { status: 409, .. }));
}

#[tokio::test]
async fn signer_login_sends_member_token() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    backend.bank_login(&bank_creds("BOC")).await.unwrap();
    let login = backend.signer_login("crib-token", &bank_creds("BOC")).await.unwrap();

    assert_eq!(login.mnemonic.as_deref(), Some("twelve words of wallet seed"));
    assert_eq!(seen.all(), ["bank_login:BOC:", "bank_login:BOC:Bearer crib-token"]);
}

#[tokio::test]
async fn activation_request_posts_bank_identity() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    backend.request_activation("bank-token", "boc-1", "BOC", "L-7").await.unwrap();
    let err = backend.request_activation("bank-token", "boc-1", "BOC", "").await.unwrap_err();

    let entry = &seen.all()[0];
    assert!(entry.starts_with("activate:Bearer bank-token:"));
    assert!(entry.contains(r#""bankId":"boc-1""#));
    assert!(entry.contains(r#""bankName":"BOC""#));
    assert!(entry.contains(r#""licenseNumber":"L-7""#));
    assert!(matches!(err, ApiError::Backend { status: 400, .. }));
}

#[tokio::test]
async fn onchain_requests_are_listed_by_status() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    let requests = backend.activation_requests("crib-token", "pending").await.unwrap();

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].bank_name, "HNB");
    assert_eq!(requests[0].license_number, "L-42");
    assert_eq!(requests[0].status, ApprovalStatus::Pending);
    assert_eq!(seen.all(), ["onchain:Bearer crib-token:pending"]);
}

#[tokio::test]
async fn crib_accounts_query_by_bank() {
    let (url, seen) = spawn_backend().await;
    let backend = HttpBackend::new(&PortalConfig::new(&url)).unwrap();

    let accounts = backend.crib_accounts("bank-token", "boc-1", "BOC").await.unwrap();
    let none = backend.crib_accounts("bank-token", "e-1", "EMPTY").await.unwrap();

    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].full_name, "Nimal Perera");
    assert!(accounts[0].is_active);
    assert!(none.is_empty());
    assert_eq!(seen.all()[0], "accounts:Bearer bank-token:boc-1:BOC");
}

#[tokio::test]
async fn unreachable_backend_is_network_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let backend = HttpBackend::new(&PortalConfig::new(&format!("http://{addr}"))).unwrap();

    let err = backend.bank_login(&bank_creds("BOC")).await.unwrap_err();

    assert!(matches!(err, ApiError::NetworkFailure(_)));
}

// =============================================================================
// Portal end to end
// =============================================================================

fn portal_config(url: &str, dir: &tempfile::TempDir) -> PortalConfig {
    let mut config = PortalConfig::new(url);
    config.session_file = dir.path().join("session.json");
    config.rpc_endpoint = Some("http://rpc.test:26657".into());
    config
}

#[tokio::test]
async fn bank_login_persists_session_to_disk() {
    let (url, _) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();

    let portal = Portal::open(portal_config(&url, &dir)).unwrap();
    let outcome = portal.login_bank(&bank_creds("BOC")).await.unwrap();

    assert_eq!(outcome.role, Role::Bank);
    assert_eq!(outcome.approval, ApprovalStatus::Approved);
    assert_eq!(outcome.landing, "/accounts");

    let reopened = Portal::open(portal_config(&url, &dir)).unwrap();
    let session = reopened.session();
    assert_eq!(session.token, "bank-token");
    assert_eq!(session.organization_name, "BOC");
    assert_eq!(reopened.signing_material().unwrap().wallet_secret.expose(), "twelve words of wallet seed");
    assert!(matches!(reopened.navigate("/facilities"), Navigation::Render { .. }));
    assert!(matches!(reopened.navigate("/crib-requests"), Navigation::Redirect { to: "/unauthorized", .. }));

    assert_eq!(reopened.request_activation("L-7").await.unwrap(), ApprovalStatus::Pending);
    assert_eq!(reopened.crib_accounts().await.unwrap().len(), 1);

    reopened.logout();
    let after = Portal::open(portal_config(&url, &dir)).unwrap();
    assert!(!after.session().is_authenticated());
}

#[tokio::test]
async fn crib_member_reviews_requests() {
    let (url, seen) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let portal = Portal::open(portal_config(&url, &dir)).unwrap();

    let outcome = portal
        .login_crib(&CribCredentials { user_name: "carol".into(), password: "secret1".into() })
        .await
        .unwrap();
    let rows = portal.report_requests(&ReportQuery::default()).await.unwrap();
    portal.approve_report(&rows[0].id, &rows[0].nic).await.unwrap();

    assert_eq!(outcome.landing, "/crib-requests");
    assert_eq!(portal.activation_requests("pending").await.unwrap()[0].bank_id, "hnb-1");
    assert!(matches!(portal.approval_status().await, Err(PortalError::WrongRole { required: Role::Bank })));
    assert!(seen.all().iter().any(|e| e.starts_with("approve:Bearer crib-token:")));
}
