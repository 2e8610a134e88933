//! Portal configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SESSION_FILE: &str = ".crib/session.json";
pub const DEFAULT_SESSION_NAMESPACE: &str = "persist:root";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// What a login does when its dependent call fails after the primary
/// credentials were accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DependentFailure {
    /// Commit the session without the fields the dependent call would add.
    #[default]
    Keep,
    /// Leave the prior session untouched and report the failure.
    Rollback,
}

/// Credentials of the bank whose signing wallet CRIB members use.
#[derive(Clone, PartialEq, Eq)]
pub struct SignerBank {
    pub bank_name: String,
    pub password: String,
}

impl std::fmt::Debug for SignerBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerBank")
            .field("bank_name", &self.bank_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Backend base URL, always ending in `/`.
    pub api_url: String,
    /// Blockchain RPC endpoint handed to the signing library untouched.
    pub rpc_endpoint: Option<String>,
    pub session_file: PathBuf,
    pub session_namespace: String,
    pub timeouts: Timeouts,
    /// Clear the session when an authenticated call reports a stale token.
    pub clear_on_stale: bool,
    pub on_dependent_failure: DependentFailure,
    pub signer_bank: Option<SignerBank>,
}

impl PortalConfig {
    /// Config with defaults for everything except the API base URL.
    #[must_use]
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: normalize_base_url(api_url),
            rpc_endpoint: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            session_namespace: DEFAULT_SESSION_NAMESPACE.to_owned(),
            timeouts: Timeouts::default(),
            clear_on_stale: false,
            on_dependent_failure: DependentFailure::Keep,
            signer_bank: None,
        }
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `CRIB_API_URL`
    ///
    /// Optional:
    /// - `CRIB_RPC_ENDPOINT`
    /// - `CRIB_SESSION_FILE`: default `.crib/session.json`
    /// - `CRIB_SESSION_NAMESPACE`: default `persist:root`
    /// - `CRIB_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CRIB_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CRIB_CLEAR_ON_STALE`: default false
    /// - `CRIB_ON_DEPENDENT_FAILURE`: `keep` (default) or `rollback`
    /// - `CRIB_SIGNER_BANK_NAME` + `CRIB_SIGNER_BANK_PASSWORD`: both or neither
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the API URL is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_api_url(None)
    }

    /// Same as [`Self::from_env`], but an explicit `api_url` (e.g. a CLI
    /// flag) takes precedence over `CRIB_API_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when no API URL is available or a value fails to parse.
    pub fn from_env_with_api_url(api_url: Option<&str>) -> Result<Self, ConfigError> {
        let api_url = api_url
            .map(str::to_owned)
            .or_else(|| env_nonempty("CRIB_API_URL"))
            .ok_or(ConfigError::Missing { var: "CRIB_API_URL" })?;
        let mut cfg = Self::new(&api_url);

        cfg.rpc_endpoint = env_nonempty("CRIB_RPC_ENDPOINT");
        if let Some(path) = env_nonempty("CRIB_SESSION_FILE") {
            cfg.session_file = PathBuf::from(path);
        }
        if let Some(ns) = env_nonempty("CRIB_SESSION_NAMESPACE") {
            cfg.session_namespace = ns;
        }
        cfg.timeouts = Timeouts {
            request_secs: env_parse_u64("CRIB_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_u64("CRIB_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        cfg.clear_on_stale = match env_nonempty("CRIB_CLEAR_ON_STALE") {
            None => false,
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::Invalid { var: "CRIB_CLEAR_ON_STALE", message: format!("not a boolean: {raw}") })?,
        };
        cfg.on_dependent_failure = parse_dependent_failure(env_nonempty("CRIB_ON_DEPENDENT_FAILURE").as_deref())?;
        cfg.signer_bank = match (env_nonempty("CRIB_SIGNER_BANK_NAME"), env_nonempty("CRIB_SIGNER_BANK_PASSWORD")) {
            (Some(bank_name), Some(password)) => Some(SignerBank { bank_name, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing { var: "CRIB_SIGNER_BANK_PASSWORD" }),
            (None, Some(_)) => return Err(ConfigError::Missing { var: "CRIB_SIGNER_BANK_NAME" }),
        };

        Ok(cfg)
    }

    /// Join an endpoint path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path.trim_start_matches('/'))
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    format!("{trimmed}/")
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn env_parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env_nonempty(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid { var: key, message: e.to_string() }),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_dependent_failure(raw: Option<&str>) -> Result<DependentFailure, ConfigError> {
    match raw.unwrap_or("keep") {
        "keep" => Ok(DependentFailure::Keep),
        "rollback" => Ok(DependentFailure::Rollback),
        other => Err(ConfigError::Invalid {
            var: "CRIB_ON_DEPENDENT_FAILURE",
            message: format!("expected 'keep' or 'rollback', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
